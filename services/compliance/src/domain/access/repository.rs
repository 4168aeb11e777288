//! 角色与权限仓储接口

use async_trait::async_trait;
use hse_errors::AppResult;

use super::permission::{Permission, PermissionId};
use super::role::{Role, RoleCode, RoleId};

/// 角色仓储接口
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 根据 ID 查找角色
    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>>;

    /// 根据代码查找角色
    async fn find_by_code(&self, code: RoleCode) -> AppResult<Option<Role>>;

    /// 列出全部角色
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// 创建角色，返回分配了 ID 的角色
    async fn create(&self, role: &Role) -> AppResult<Role>;

    /// 更新角色
    async fn update(&self, role: &Role) -> AppResult<Role>;
}

/// 权限仓储接口
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// 列出全部权限行
    async fn list_all(&self) -> AppResult<Vec<Permission>>;

    /// 列出角色的权限行
    async fn list_by_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>>;

    async fn find_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>>;

    /// 批量创建
    async fn create(&self, permissions: &[Permission]) -> AppResult<Vec<Permission>>;

    async fn update(&self, permission: &Permission) -> AppResult<Permission>;
}
