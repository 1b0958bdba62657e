pub mod auth_handler;

pub use auth_handler::{
    __path_list_users, __path_login, __path_register, list_users, login, register,
};
