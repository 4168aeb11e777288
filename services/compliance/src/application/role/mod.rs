//! 角色与权限设置 (管理端)

pub mod commands;
pub mod handlers;

pub use commands::*;
pub use handlers::{RoleAdminHandler, SeedReport};
