//! 工作流查询处理器

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use hse_common::{PagedResult, Pagination, SiteId, UserId};
use hse_domain_core::{Language, pick};
use hse_errors::{AppError, AppResult};
use tracing::debug;

use super::queries::{WorkflowStats, WorkflowView};
use crate::application::access::AccessControlService;
use crate::domain::access::{
    ActingUser, Action, PermissionRepository, Scope, filter_by_scope, is_in_scope, resources,
};
use crate::domain::directory::{SiteRepository, UserRepository};
use crate::domain::workflow::{Workflow, WorkflowFilter, WorkflowId, WorkflowRepository};

/// 统计时每页拉取的记录数
const STATS_PAGE_SIZE: u32 = 100;

const NAME_LOOKUP_CONCURRENCY: usize = 8;

/// 工作流查询处理器
pub struct WorkflowQueryHandler<R, PR, UR, SR>
where
    R: WorkflowRepository,
    PR: PermissionRepository,
    UR: UserRepository,
    SR: SiteRepository,
{
    workflow_repo: Arc<R>,
    access: Arc<AccessControlService<PR>>,
    user_repo: Arc<UR>,
    site_repo: Arc<SR>,
}

impl<R, PR, UR, SR> WorkflowQueryHandler<R, PR, UR, SR>
where
    R: WorkflowRepository,
    PR: PermissionRepository,
    UR: UserRepository,
    SR: SiteRepository,
{
    pub fn new(
        workflow_repo: Arc<R>,
        access: Arc<AccessControlService<PR>>,
        user_repo: Arc<UR>,
        site_repo: Arc<SR>,
    ) -> Self {
        Self {
            workflow_repo,
            access,
            user_repo,
            site_repo,
        }
    }

    /// 获取单个工作流，不可见的记录按不存在处理
    pub async fn get(
        &self,
        actor: &ActingUser,
        id: WorkflowId,
        lang: Language,
    ) -> AppResult<WorkflowView> {
        let not_found = || AppError::not_found(format!("Workflow {} not found", id));

        let scope = self
            .access
            .resolve_scope(actor, resources::WORKFLOWS, Action::Read)
            .await?
            .ok_or_else(not_found)?;
        let workflow = self
            .workflow_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(not_found)?;
        if !is_in_scope(&workflow, scope, actor) {
            debug!(workflow_id = %id, user_id = %actor.id, "Workflow outside read scope");
            return Err(not_found());
        }

        let mut views = self.render(actor, vec![workflow], lang).await?;
        views.pop().ok_or_else(not_found)
    }

    /// 列出当前用户可见的工作流
    ///
    /// 范围条件下推到存储端，分页总数因此只计可见记录；无读取权限时返回空页
    pub async fn list_visible(
        &self,
        actor: &ActingUser,
        filter: WorkflowFilter,
        pagination: Pagination,
        lang: Language,
    ) -> AppResult<PagedResult<WorkflowView>> {
        let Some(scope) = self.read_scope(actor).await? else {
            return Ok(PagedResult::new(Vec::new(), 0, &pagination));
        };
        let Some(filter) = filter.within_scope(scope, actor) else {
            return Ok(PagedResult::new(Vec::new(), 0, &pagination));
        };

        let mut page = self.workflow_repo.list(&filter, &pagination).await?;
        let visible = filter_by_scope(std::mem::take(&mut page.items), scope, actor);
        let views = self.render(actor, visible, lang).await?;

        Ok(page.with_items(views))
    }

    /// 可见工作流的统计
    pub async fn stats(&self, actor: &ActingUser) -> AppResult<WorkflowStats> {
        let mut stats = WorkflowStats::default();
        let Some(scope) = self.read_scope(actor).await? else {
            return Ok(stats);
        };
        let Some(filter) = WorkflowFilter::default().within_scope(scope, actor) else {
            return Ok(stats);
        };

        let now = Utc::now();
        let mut pagination = Pagination::new(1, STATS_PAGE_SIZE);
        loop {
            let page = self.workflow_repo.list(&filter, &pagination).await?;
            let more = !page.items.is_empty() && page.has_more();
            for workflow in filter_by_scope(page.items, scope, actor) {
                stats.record(&workflow, now);
            }
            if !more {
                break;
            }
            pagination.page += 1;
        }

        Ok(stats)
    }

    /// 并发解析执行人姓名 (去重后查询)
    async fn assignee_names(
        &self,
        workflows: &[Workflow],
        lang: Language,
    ) -> AppResult<HashMap<UserId, Option<String>>> {
        let assignees: HashSet<UserId> = workflows.iter().filter_map(|w| w.assigned_to).collect();

        let lookups: Vec<AppResult<(UserId, Option<String>)>> = stream::iter(assignees)
            .map(|id| async move {
                let user = self.user_repo.find_by_id(&id).await?;
                Ok::<_, AppError>((id, user.map(|u| pick(&u, lang).to_string())))
            })
            .buffer_unordered(NAME_LOOKUP_CONCURRENCY)
            .collect()
            .await;

        lookups.into_iter().collect()
    }

    async fn read_scope(&self, actor: &ActingUser) -> AppResult<Option<Scope>> {
        self.access
            .resolve_scope(actor, resources::WORKFLOWS, Action::Read)
            .await
    }

    /// 展开为视图：解析执行人/站点名称，并按更新权限计算可用操作
    async fn render(
        &self,
        actor: &ActingUser,
        workflows: Vec<Workflow>,
        lang: Language,
    ) -> AppResult<Vec<WorkflowView>> {
        if workflows.is_empty() {
            return Ok(Vec::new());
        }

        let update_scope = self
            .access
            .resolve_scope(actor, resources::WORKFLOWS, Action::Update)
            .await?;

        let site_names: HashMap<SiteId, String> = self
            .site_repo
            .list()
            .await?
            .into_iter()
            .map(|site| (site.id, pick(&site, lang).to_string()))
            .collect();

        let user_names = self.assignee_names(&workflows, lang).await?;

        let now = Utc::now();
        Ok(workflows
            .iter()
            .map(|workflow| {
                let actions = match update_scope {
                    Some(scope) if is_in_scope(workflow, scope, actor) => {
                        workflow.available_actions(actor)
                    }
                    _ => Vec::new(),
                };
                let assignee_name = workflow
                    .assigned_to
                    .and_then(|id| user_names.get(&id).cloned().flatten());
                let site_name = workflow
                    .site_id
                    .and_then(|id| site_names.get(&id).cloned());
                WorkflowView::build(workflow, lang, assignee_name, site_name, actions, now)
            })
            .collect())
    }
}
