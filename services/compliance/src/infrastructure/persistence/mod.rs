//! 持久化层模块 (记录存储)

pub mod directory_repository;
mod paging;
pub mod permission_repository;
pub mod role_repository;
pub mod schema;
pub mod workflow_repository;

pub use directory_repository::{RecordStoreSiteRepository, RecordStoreUserRepository};
pub use permission_repository::RecordStorePermissionRepository;
pub use role_repository::RecordStoreRoleRepository;
pub use workflow_repository::RecordStoreWorkflowRepository;
