//! 工作流仓储接口

use async_trait::async_trait;
use hse_common::{PagedResult, Pagination, SiteId, UserId};
use hse_errors::AppResult;

use super::status::{Priority, WorkflowStatus, WorkflowType};
use super::workflow::{Workflow, WorkflowId};
use crate::domain::access::{ActingUser, Scope};

/// 列表过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowFilter {
    pub status: Option<WorkflowStatus>,
    pub workflow_type: Option<WorkflowType>,
    pub priority: Option<Priority>,
    pub site_id: Option<SiteId>,
    pub assigned_to: Option<UserId>,
    /// 标题关键字 (任一语言)
    pub search: Option<String>,
}

impl WorkflowFilter {
    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// 将可见范围下推为存储端过滤条件
    ///
    /// 范围无法满足时 (site 范围但用户没有站点，或与已有条件冲突) 返回 `None`
    pub fn within_scope(mut self, scope: Scope, actor: &ActingUser) -> Option<Self> {
        match scope {
            Scope::All => {}
            Scope::Site => {
                let site = actor.site_id?;
                if self.site_id.is_some_and(|s| s != site) {
                    return None;
                }
                self.site_id = Some(site);
            }
            Scope::Own => {
                if self.assigned_to.is_some_and(|u| u != actor.id) {
                    return None;
                }
                self.assigned_to = Some(actor.id);
            }
        }
        Some(self)
    }
}

/// 工作流仓储接口
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn find_by_id(&self, id: &WorkflowId) -> AppResult<Option<Workflow>>;

    async fn list(
        &self,
        filter: &WorkflowFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Workflow>>;

    /// 创建，返回分配了 ID 和初始版本的工作流
    async fn create(&self, workflow: &Workflow) -> AppResult<Workflow>;

    /// 更新
    ///
    /// 存储中的版本必须等于 `workflow.version`，否则返回 `Conflict`；
    /// 成功后版本号加一
    async fn update(&self, workflow: &Workflow) -> AppResult<Workflow>;

    async fn delete(&self, id: &WorkflowId) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::RoleCode;

    #[test]
    fn test_within_scope_pushes_down_constraints() {
        let actor = ActingUser::new(7, RoleCode::User, Some(SiteId(3)));

        let own = WorkflowFilter::default().within_scope(Scope::Own, &actor).unwrap();
        assert_eq!(own.assigned_to, Some(UserId(7)));

        let site = WorkflowFilter::default().within_scope(Scope::Site, &actor).unwrap();
        assert_eq!(site.site_id, Some(SiteId(3)));

        let all = WorkflowFilter::default()
            .with_status(WorkflowStatus::Completed)
            .within_scope(Scope::All, &actor)
            .unwrap();
        assert_eq!(all.site_id, None);
        assert_eq!(all.status, Some(WorkflowStatus::Completed));
    }

    #[test]
    fn test_within_scope_conflicts() {
        let actor = ActingUser::new(7, RoleCode::Manager, None);
        assert!(WorkflowFilter::default().within_scope(Scope::Site, &actor).is_none());

        let filter = WorkflowFilter {
            assigned_to: Some(UserId(8)),
            ..Default::default()
        };
        assert!(filter.within_scope(Scope::Own, &actor).is_none());
    }
}
