//! 角色与权限设置命令

use hse_domain_core::LocalizedText;

use crate::domain::access::{ActingUser, PermissionId, RoleId, Scope};

/// 修改角色显示名称
#[derive(Debug, Clone)]
pub struct RenameRoleCommand {
    pub actor: ActingUser,
    pub role_id: RoleId,
    pub name: LocalizedText,
}

/// 修改单条权限
#[derive(Debug, Clone)]
pub struct SetPermissionCommand {
    pub actor: ActingUser,
    pub permission_id: PermissionId,
    pub allowed: bool,
    /// 为空时保留原范围
    pub scope: Option<Scope>,
}
