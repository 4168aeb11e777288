//! 工作流聚合根

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use hse_common::{AuditInfo, SiteId, UserId};
use hse_domain_core::{AggregateRoot, Entity, Localized, LocalizedText};
use hse_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::status::{Priority, WorkflowAction, WorkflowStatus, WorkflowType, transition};
use crate::domain::access::{ActingUser, ScopedRecord};

/// 工作流 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct WorkflowId(pub i64);

impl std::str::FromStr for WorkflowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// 新建工作流参数
#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub workflow_type: WorkflowType,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub site_id: Option<SiteId>,
    pub created_by: UserId,
    pub due_date: Option<DateTime<Utc>>,
    pub required_approvals: u32,
}

/// 工作流聚合根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub workflow_type: WorkflowType,
    pub status: WorkflowStatus,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub site_id: Option<SiteId>,
    pub created_by: UserId,
    pub due_date: Option<DateTime<Utc>>,
    /// 所需审批数 (≥ 1)
    pub required_approvals: u32,
    /// 已获审批数，不超过 `required_approvals`
    pub approval_count: u32,
    pub approved_by: Vec<UserId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub completion_percentage: u8,
    pub completion_notes: LocalizedText,
    /// 乐观并发版本号，由仓储维护
    pub version: u64,
    pub audit_info: AuditInfo,
}

impl Workflow {
    /// 创建工作流
    ///
    /// 指定了执行人时直接进入 `Assigned`，否则为 `Draft`
    pub fn new(params: NewWorkflow) -> AppResult<Self> {
        if params.title.is_blank() {
            return Err(AppError::validation("Workflow title cannot be empty"));
        }
        if params.required_approvals < 1 {
            return Err(AppError::validation(
                "Workflow requires at least one approval",
            ));
        }

        let now = Utc::now();
        let (status, assigned_at) = match params.assigned_to {
            Some(_) => (WorkflowStatus::Assigned, Some(now)),
            None => (WorkflowStatus::Draft, None),
        };

        Ok(Self {
            id: WorkflowId(0),
            title: params.title,
            description: params.description,
            workflow_type: params.workflow_type,
            status,
            priority: params.priority,
            assigned_to: params.assigned_to,
            site_id: params.site_id,
            created_by: params.created_by,
            due_date: params.due_date,
            required_approvals: params.required_approvals,
            approval_count: 0,
            approved_by: Vec::new(),
            assigned_at,
            started_at: None,
            completed_at: None,
            approved_at: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            completion_percentage: 0,
            completion_notes: LocalizedText::default(),
            version: 0,
            audit_info: AuditInfo::new(Some(params.created_by)),
        })
    }

    fn is_assignee(&self, actor: &ActingUser) -> bool {
        self.assigned_to == Some(actor.id)
    }

    fn allows(&self, action: WorkflowAction) -> bool {
        transition(self.status, action).is_some()
    }

    // ========== 操作门控 ==========

    pub fn can_assign(&self, actor: &ActingUser) -> bool {
        self.allows(WorkflowAction::Assign) && actor.role.is_supervisor()
    }

    pub fn can_start(&self, actor: &ActingUser) -> bool {
        self.status == WorkflowStatus::Assigned && self.is_assignee(actor)
    }

    pub fn can_complete(&self, actor: &ActingUser) -> bool {
        self.status == WorkflowStatus::InProgress && self.is_assignee(actor)
    }

    pub fn can_approve(&self, actor: &ActingUser) -> bool {
        self.status == WorkflowStatus::Completed && actor.role.is_supervisor()
    }

    /// 驳回与审批使用同一门控
    pub fn can_reject(&self, actor: &ActingUser) -> bool {
        self.can_approve(actor)
    }

    pub fn can_resubmit(&self, actor: &ActingUser) -> bool {
        self.status == WorkflowStatus::Rejected && self.created_by == actor.id
    }

    /// 当前用户可执行的操作 (用于启用按钮)
    pub fn available_actions(&self, actor: &ActingUser) -> Vec<WorkflowAction> {
        WorkflowAction::ALL
            .into_iter()
            .filter(|action| match action {
                WorkflowAction::Assign => self.can_assign(actor),
                WorkflowAction::Start => self.can_start(actor),
                WorkflowAction::Complete => self.can_complete(actor),
                WorkflowAction::Approve => {
                    self.can_approve(actor) && !self.approved_by.contains(&actor.id)
                }
                WorkflowAction::Reject => self.can_reject(actor),
                WorkflowAction::Resubmit => self.can_resubmit(actor),
            })
            .collect()
    }

    /// 状态检查，非法转移统一在此拒绝
    fn ensure_transition(&self, action: WorkflowAction) -> AppResult<WorkflowStatus> {
        transition(self.status, action).ok_or_else(|| {
            AppError::failed_precondition(format!(
                "Cannot {} workflow {} in status {}",
                action, self.id, self.status
            ))
        })
    }

    // ========== 状态转移 ==========

    /// 指派执行人 (可在开始前改派)
    pub fn assign(&mut self, actor: &ActingUser, assignee: UserId) -> AppResult<()> {
        let next = self.ensure_transition(WorkflowAction::Assign)?;
        if !actor.role.is_supervisor() {
            return Err(AppError::forbidden("Only a manager or ceo can assign workflows"));
        }
        self.status = next;
        self.assigned_to = Some(assignee);
        self.assigned_at = Some(Utc::now());
        self.touch(actor.id);
        Ok(())
    }

    /// 开始执行
    pub fn start(&mut self, actor: &ActingUser) -> AppResult<()> {
        let next = self.ensure_transition(WorkflowAction::Start)?;
        if !self.is_assignee(actor) {
            return Err(AppError::forbidden("Only the assignee can start this workflow"));
        }
        self.status = next;
        self.started_at = Some(Utc::now());
        self.touch(actor.id);
        Ok(())
    }

    /// 完成执行，记录三语完成说明
    pub fn complete(&mut self, actor: &ActingUser, notes: LocalizedText) -> AppResult<()> {
        let next = self.ensure_transition(WorkflowAction::Complete)?;
        if !self.is_assignee(actor) {
            return Err(AppError::forbidden("Only the assignee can complete this workflow"));
        }
        self.status = next;
        self.completion_percentage = 100;
        self.completion_notes = notes;
        self.completed_at = Some(Utc::now());
        self.touch(actor.id);
        Ok(())
    }

    /// 记录一次审批
    ///
    /// 审批数达到 `required_approvals` 时进入 `Approved`，否则保持 `Completed`。
    /// 返回是否已最终批准
    pub fn approve(&mut self, actor: &ActingUser) -> AppResult<bool> {
        let next = self.ensure_transition(WorkflowAction::Approve)?;
        if !actor.role.is_supervisor() {
            return Err(AppError::forbidden("Only a manager or ceo can approve workflows"));
        }
        if self.approved_by.contains(&actor.id) {
            return Err(AppError::conflict(format!(
                "User {} has already approved workflow {}",
                actor.id, self.id
            )));
        }

        if self.approval_count >= self.required_approvals {
            return Err(AppError::failed_precondition(format!(
                "Workflow {} already has {} of {} approvals",
                self.id, self.approval_count, self.required_approvals
            )));
        }

        self.approval_count += 1;
        self.approved_by.push(actor.id);
        self.touch(actor.id);

        if self.approval_count == self.required_approvals {
            self.status = next;
            self.approved_at = Some(Utc::now());
            return Ok(true);
        }
        Ok(false)
    }

    /// 驳回，理由必填
    pub fn reject(&mut self, actor: &ActingUser, reason: &str) -> AppResult<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("Rejection reason cannot be empty"));
        }
        let next = self.ensure_transition(WorkflowAction::Reject)?;
        if !actor.role.is_supervisor() {
            return Err(AppError::forbidden("Only a manager or ceo can reject workflows"));
        }
        self.status = next;
        self.rejected_by = Some(actor.id);
        self.rejected_at = Some(Utc::now());
        self.rejection_reason = Some(reason.to_string());
        self.touch(actor.id);
        Ok(())
    }

    /// 创建人重新提交被驳回的工作流，回到草稿
    pub fn resubmit(&mut self, actor: &ActingUser) -> AppResult<()> {
        let next = self.ensure_transition(WorkflowAction::Resubmit)?;
        if self.created_by != actor.id {
            return Err(AppError::forbidden("Only the creator can resubmit this workflow"));
        }
        self.status = next;
        self.assigned_at = None;
        self.started_at = None;
        self.completed_at = None;
        self.approved_at = None;
        self.approval_count = 0;
        self.approved_by.clear();
        self.completion_percentage = 0;
        self.completion_notes = LocalizedText::default();
        self.rejected_at = None;
        self.rejected_by = None;
        self.rejection_reason = None;
        self.touch(actor.id);
        Ok(())
    }

    /// 是否逾期：有截止时间、已过期且仍未完成
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < now)
    }

    /// 是否等待审批
    pub fn is_awaiting_approval(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }
}

impl ScopedRecord for Workflow {
    fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    /// 以执行人作为 own 范围的归属
    fn owner_id(&self) -> Option<UserId> {
        self.assigned_to
    }
}

impl Localized for Workflow {
    fn localized(&self) -> &LocalizedText {
        &self.title
    }
}

impl Entity for Workflow {
    type Id = WorkflowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Workflow {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::RoleCode;
    use chrono::Duration;

    fn manager(id: i64) -> ActingUser {
        ActingUser::new(id, RoleCode::Manager, Some(SiteId(1)))
    }

    fn user(id: i64) -> ActingUser {
        ActingUser::new(id, RoleCode::User, Some(SiteId(1)))
    }

    fn params(assigned_to: Option<i64>) -> NewWorkflow {
        NewWorkflow {
            title: LocalizedText::new("Fire extinguisher check", "فحص طفايات الحريق", "Contrôle des extincteurs"),
            description: LocalizedText::default(),
            workflow_type: WorkflowType::FireSafety,
            priority: Priority::High,
            assigned_to: assigned_to.map(UserId),
            site_id: Some(SiteId(1)),
            created_by: UserId(2),
            due_date: None,
            required_approvals: 1,
        }
    }

    fn workflow_in(status: WorkflowStatus, assigned_to: i64) -> Workflow {
        let mut wf = Workflow::new(params(Some(assigned_to))).unwrap();
        wf.id = WorkflowId(10);
        wf.status = status;
        wf
    }

    #[test]
    fn test_new_starts_in_draft_or_assigned() {
        let draft = Workflow::new(params(None)).unwrap();
        assert_eq!(draft.status, WorkflowStatus::Draft);
        assert!(draft.assigned_at.is_none());

        let assigned = Workflow::new(params(Some(7))).unwrap();
        assert_eq!(assigned.status, WorkflowStatus::Assigned);
        assert!(assigned.assigned_at.is_some());
    }

    #[test]
    fn test_new_validates_input() {
        let mut p = params(None);
        p.title = LocalizedText::default();
        assert!(matches!(Workflow::new(p), Err(AppError::Validation(_))));

        let mut p = params(None);
        p.required_approvals = 0;
        assert!(matches!(Workflow::new(p), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_can_start_only_for_assignee_in_assigned() {
        let wf = workflow_in(WorkflowStatus::Assigned, 7);
        assert!(wf.can_start(&user(7)));
        assert!(!wf.can_start(&user(8)));

        for status in WorkflowStatus::ALL {
            if status != WorkflowStatus::Assigned {
                assert!(!workflow_in(status, 7).can_start(&user(7)), "{status}");
            }
        }
    }

    #[test]
    fn test_start_and_complete() {
        let mut wf = workflow_in(WorkflowStatus::Assigned, 7);

        assert!(matches!(wf.start(&user(8)), Err(AppError::Forbidden(_))));
        assert_eq!(wf.status, WorkflowStatus::Assigned);

        wf.start(&user(7)).unwrap();
        assert_eq!(wf.status, WorkflowStatus::InProgress);
        assert!(wf.started_at.is_some());

        wf.complete(&user(7), LocalizedText::uniform("All extinguishers tagged"))
            .unwrap();
        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert_eq!(wf.completion_percentage, 100);
        assert_eq!(wf.completion_notes.fr, "All extinguishers tagged");
    }

    #[test]
    fn test_illegal_transition_is_precondition_failure() {
        let mut wf = workflow_in(WorkflowStatus::Draft, 7);
        assert!(matches!(
            wf.complete(&user(7), LocalizedText::default()),
            Err(AppError::FailedPrecondition(_))
        ));
        assert!(matches!(wf.approve(&manager(2)), Err(AppError::FailedPrecondition(_))));
    }

    #[test]
    fn test_approve_is_count_gated() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        wf.required_approvals = 2;
        wf.approval_count = 1;
        wf.approved_by = vec![UserId(3)];

        let approved = wf.approve(&manager(4)).unwrap();
        assert!(approved);
        assert_eq!(wf.approval_count, 2);
        assert_eq!(wf.status, WorkflowStatus::Approved);
        assert!(wf.approved_at.is_some());

        assert!(matches!(wf.approve(&manager(5)), Err(AppError::FailedPrecondition(_))));
        assert_eq!(wf.approval_count, 2);
    }

    #[test]
    fn test_partial_approval_stays_completed() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        wf.required_approvals = 3;

        assert!(!wf.approve(&manager(4)).unwrap());
        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert_eq!(wf.approval_count, 1);

        assert!(matches!(wf.approve(&manager(4)), Err(AppError::Conflict(_))));
        assert_eq!(wf.approval_count, 1);
        assert!(!wf.available_actions(&manager(4)).contains(&WorkflowAction::Approve));
        assert!(wf.available_actions(&manager(5)).contains(&WorkflowAction::Approve));
    }

    #[test]
    fn test_saturated_count_refuses_further_approval() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        wf.required_approvals = 2;
        wf.approval_count = 2;
        wf.approved_by = vec![UserId(3)];

        let err = wf.approve(&manager(4)).unwrap_err();
        assert!(matches!(err, AppError::FailedPrecondition(_)));
        assert_eq!(wf.approval_count, 2);
        assert_eq!(wf.approved_by, vec![UserId(3)]);
        assert_eq!(wf.status, WorkflowStatus::Completed);
    }

    #[test]
    fn test_user_cannot_approve() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        assert!(!wf.can_approve(&user(7)));
        assert!(matches!(wf.approve(&user(7)), Err(AppError::Forbidden(_))));
        assert_eq!(wf.approval_count, 0);
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        assert!(matches!(wf.reject(&manager(2), "   "), Err(AppError::Validation(_))));
        assert_eq!(wf.status, WorkflowStatus::Completed);

        wf.reject(&manager(2), "Photos missing").unwrap();
        assert_eq!(wf.status, WorkflowStatus::Rejected);
        assert_eq!(wf.rejected_by, Some(UserId(2)));
        assert_eq!(wf.rejection_reason.as_deref(), Some("Photos missing"));
    }

    #[test]
    fn test_resubmit_by_creator_only() {
        let mut wf = workflow_in(WorkflowStatus::Completed, 7);
        wf.reject(&manager(2), "Incomplete").unwrap();

        assert!(matches!(wf.resubmit(&manager(9)), Err(AppError::Forbidden(_))));
        wf.resubmit(&manager(2)).unwrap();
        assert_eq!(wf.status, WorkflowStatus::Draft);
        assert!(wf.rejection_reason.is_none());
        assert_eq!(wf.approval_count, 0);
        assert_eq!(wf.completion_percentage, 0);
        assert!(wf.can_assign(&manager(2)));
    }

    #[test]
    fn test_available_actions() {
        let wf = workflow_in(WorkflowStatus::Assigned, 7);
        assert_eq!(wf.available_actions(&user(7)), vec![WorkflowAction::Start]);
        assert_eq!(wf.available_actions(&manager(2)), vec![WorkflowAction::Assign]);
        assert!(wf.available_actions(&user(8)).is_empty());
    }

    #[test]
    fn test_overdue() {
        let now = Utc::now();
        let mut wf = workflow_in(WorkflowStatus::InProgress, 7);
        wf.due_date = Some(now - Duration::hours(1));
        assert!(wf.is_overdue(now));

        wf.status = WorkflowStatus::Completed;
        assert!(!wf.is_overdue(now));

        wf.status = WorkflowStatus::Assigned;
        wf.due_date = Some(now + Duration::hours(1));
        assert!(!wf.is_overdue(now));
    }
}
