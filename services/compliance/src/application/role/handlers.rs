//! 角色与权限设置处理器

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hse_domain_core::AggregateRoot;
use hse_errors::{AppError, AppResult};
use tracing::info;

use super::commands::*;
use crate::application::access::AccessControlService;
use crate::domain::access::{
    Action, Permission, PermissionRepository, PermissionTable, Role, RoleCode, RoleId,
    RoleRepository, resources,
};

/// 初始化结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub permissions_created: usize,
}

impl SeedReport {
    pub fn is_noop(&self) -> bool {
        self.roles_created == 0 && self.permissions_created == 0
    }
}

/// 角色与权限设置处理器
pub struct RoleAdminHandler<RR, PR>
where
    RR: RoleRepository,
    PR: PermissionRepository,
{
    role_repo: Arc<RR>,
    permission_repo: Arc<PR>,
    access: Arc<AccessControlService<PR>>,
}

impl<RR, PR> RoleAdminHandler<RR, PR>
where
    RR: RoleRepository,
    PR: PermissionRepository,
{
    pub fn new(
        role_repo: Arc<RR>,
        permission_repo: Arc<PR>,
        access: Arc<AccessControlService<PR>>,
    ) -> Self {
        Self {
            role_repo,
            permission_repo,
            access,
        }
    }

    /// 写入三个系统角色和默认权限矩阵
    ///
    /// 已存在的角色和 (角色, 资源, 操作) 组合保持不变，可重复执行
    pub async fn seed_defaults(&self) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        let mut role_ids: HashMap<RoleCode, RoleId> = HashMap::new();
        for code in RoleCode::ALL {
            let role = match self.role_repo.find_by_code(code).await? {
                Some(role) => role,
                None => {
                    let created = self.role_repo.create(&Role::system(code)).await?;
                    report.roles_created += 1;
                    info!(role_id = %created.id, code = %code, "System role created");
                    created
                }
            };
            role_ids.insert(code, role.id);
        }

        let existing: HashSet<(RoleCode, String, Action)> = self
            .permission_repo
            .list_all()
            .await?
            .into_iter()
            .map(|p| (p.role_code, p.resource, p.action))
            .collect();

        let missing: Vec<Permission> = PermissionTable::default_matrix()
            .entries()
            .iter()
            .filter(|entry| {
                !existing.contains(&(entry.role, entry.resource.clone(), entry.action))
            })
            .filter_map(|entry| {
                role_ids
                    .get(&entry.role)
                    .map(|role_id| Permission::from_entry(*role_id, entry))
            })
            .collect();

        if !missing.is_empty() {
            let created = self.permission_repo.create(&missing).await?;
            report.permissions_created = created.len();
        }

        info!(
            roles_created = report.roles_created,
            permissions_created = report.permissions_created,
            "Default roles and permissions seeded"
        );
        Ok(report)
    }

    /// 修改角色显示名称 (需要 `roles:update`)
    pub async fn rename_role(&self, cmd: RenameRoleCommand) -> AppResult<Role> {
        self.access
            .authorize(&cmd.actor, resources::ROLES, Action::Update)
            .await?;

        let mut role = self
            .role_repo
            .find_by_id(&cmd.role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {} not found", cmd.role_id)))?;

        role.rename(cmd.name)?;
        role.touch(cmd.actor.id);
        let updated = self.role_repo.update(&role).await?;

        info!(role_id = %updated.id, by = %cmd.actor.id, "Role renamed");
        Ok(updated)
    }

    /// 修改单条权限 (需要 `settings:update`)
    ///
    /// CEO 对角色和设置的授权不可撤销或缩小
    pub async fn set_permission(&self, cmd: SetPermissionCommand) -> AppResult<Permission> {
        self.access
            .authorize(&cmd.actor, resources::SETTINGS, Action::Update)
            .await?;

        let mut permission = self
            .permission_repo
            .find_by_id(&cmd.permission_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Permission {} not found", cmd.permission_id))
            })?;

        permission.set(cmd.allowed, cmd.scope)?;
        let updated = self.permission_repo.update(&permission).await?;

        info!(
            permission_id = %updated.id,
            role = %updated.role_code,
            code = %updated.code(),
            allowed = updated.allowed,
            scope = %updated.scope,
            by = %cmd.actor.id,
            "Permission updated"
        );
        Ok(updated)
    }
}
