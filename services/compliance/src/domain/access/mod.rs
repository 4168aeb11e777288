//! 访问控制领域模块
//!
//! 角色 × 资源 × 操作 → 允许的可见范围 (all / site / own) 或拒绝

pub mod permission;
pub mod repository;
pub mod role;
pub mod scope;

pub use permission::{
    Permission, PermissionEntry, PermissionId, PermissionTable, resolve_scope, resources,
};
pub use repository::{PermissionRepository, RoleRepository};
pub use role::{Role, RoleCode, RoleId};
pub use scope::{Action, ActingUser, Scope, ScopedRecord, filter_by_scope, is_in_scope};
