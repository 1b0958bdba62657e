pub mod file_handler;
pub mod share_handler;

pub use file_handler::{
    __path_download_file, __path_list_my_uploads, __path_upload_files, download_file,
    list_my_uploads, upload_files,
};
pub use share_handler::{
    __path_create_share_link, __path_list_shared_with_me, __path_redeem_share_link,
    __path_share_with_users, create_share_link, list_shared_with_me, redeem_share_link,
    share_with_users,
};
