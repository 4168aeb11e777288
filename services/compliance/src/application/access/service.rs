//! 访问控制服务
//!
//! 列表/详情页据此过滤可见记录，并决定启用哪些操作按钮

use std::sync::Arc;

use hse_errors::{AppError, AppResult};
use metrics::counter;
use tracing::debug;

use crate::domain::access::{
    Action, ActingUser, PermissionRepository, PermissionTable, Scope, ScopedRecord,
    filter_by_scope, is_in_scope, resolve_scope,
};

/// 访问控制服务
///
/// 权限表从权限仓储加载；存储中尚无权限行时使用默认矩阵
pub struct AccessControlService<PR>
where
    PR: PermissionRepository,
{
    permission_repo: Arc<PR>,
}

impl<PR> AccessControlService<PR>
where
    PR: PermissionRepository,
{
    pub fn new(permission_repo: Arc<PR>) -> Self {
        Self { permission_repo }
    }

    /// 当前生效的权限表
    pub async fn permission_table(&self) -> AppResult<PermissionTable> {
        let permissions = self.permission_repo.list_all().await?;
        if permissions.is_empty() {
            debug!("No stored permissions, using default matrix");
            return Ok(PermissionTable::default_matrix());
        }
        Ok(PermissionTable::from_permissions(&permissions))
    }

    /// 解析可见范围，`None` 表示拒绝
    pub async fn resolve_scope(
        &self,
        actor: &ActingUser,
        resource: &str,
        action: Action,
    ) -> AppResult<Option<Scope>> {
        let table = self.permission_table().await?;
        let scope = resolve_scope(&table, actor.role, resource, action);

        counter!("access_checks_total",
            "resource" => resource.to_string(),
            "action" => action.as_str(),
            "allowed" => scope.is_some().to_string()
        )
        .increment(1);
        debug!(
            user_id = %actor.id,
            role = %actor.role,
            resource,
            action = %action,
            scope = ?scope,
            "Resolved access scope"
        );

        Ok(scope)
    }

    /// 命令路径使用：拒绝时返回 `Forbidden`
    pub async fn authorize(
        &self,
        actor: &ActingUser,
        resource: &str,
        action: Action,
    ) -> AppResult<Scope> {
        self.resolve_scope(actor, resource, action)
            .await?
            .ok_or_else(|| {
                AppError::forbidden(format!(
                    "Role {} is not allowed to {} {}",
                    actor.role, action, resource
                ))
            })
    }

    /// 校验操作权限并确认目标记录在范围内
    pub async fn authorize_record<T: ScopedRecord + ?Sized>(
        &self,
        actor: &ActingUser,
        resource: &str,
        action: Action,
        record: &T,
    ) -> AppResult<Scope> {
        let scope = self.authorize(actor, resource, action).await?;
        if !is_in_scope(record, scope, actor) {
            return Err(AppError::forbidden(format!(
                "Record is outside the {} scope of user {}",
                scope, actor.id
            )));
        }
        Ok(scope)
    }

    /// 过滤可读记录，无读取权限时返回空列表
    pub async fn filter_visible<T: ScopedRecord>(
        &self,
        actor: &ActingUser,
        resource: &str,
        records: Vec<T>,
    ) -> AppResult<Vec<T>> {
        match self.resolve_scope(actor, resource, Action::Read).await? {
            Some(scope) => Ok(filter_by_scope(records, scope, actor)),
            None => Ok(Vec::new()),
        }
    }

    /// 资源上允许的操作及其范围
    pub async fn allowed_actions(
        &self,
        actor: &ActingUser,
        resource: &str,
    ) -> AppResult<Vec<(Action, Scope)>> {
        let table = self.permission_table().await?;
        Ok(Action::ALL
            .into_iter()
            .filter_map(|action| {
                resolve_scope(&table, actor.role, resource, action).map(|scope| (action, scope))
            })
            .collect())
    }
}
