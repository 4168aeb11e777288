//! 组织目录 (用户、站点)，对本服务只读

pub mod repository;
pub mod site;
pub mod user;

pub use repository::{SiteRepository, UserRepository};
pub use site::Site;
pub use user::User;
