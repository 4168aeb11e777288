//! 工作流命令处理器
//!
//! 处理流程：本地校验 → 权限与范围 → 加载 → 领域转移 → 持久化 → 发布事件。
//! 持久化失败原样返回，存储中的记录保持不变，不做重试或补偿

use std::sync::Arc;

use hse_errors::{AppError, AppResult};
use hse_event_core::{DomainEvent, EventEnvelope, EventMetadata};
use hse_ports::EventPublisher;
use metrics::counter;
use tracing::{error, info, warn};

use super::commands::*;
use crate::application::access::AccessControlService;
use crate::domain::access::{ActingUser, Action, PermissionRepository, Scope, resources};
use crate::domain::workflow::{
    NewWorkflow, Workflow, WorkflowEvent, WorkflowId, WorkflowRepository, WorkflowStatus,
};

/// 事件主题前缀
pub const EVENT_CONTEXT: &str = "compliance";

/// 工作流命令处理器
pub struct WorkflowCommandHandler<R, PR, EP>
where
    R: WorkflowRepository,
    PR: PermissionRepository,
    EP: EventPublisher,
{
    workflow_repo: Arc<R>,
    access: Arc<AccessControlService<PR>>,
    event_publisher: Arc<EP>,
    default_required_approvals: u32,
}

impl<R, PR, EP> WorkflowCommandHandler<R, PR, EP>
where
    R: WorkflowRepository,
    PR: PermissionRepository,
    EP: EventPublisher,
{
    pub fn new(
        workflow_repo: Arc<R>,
        access: Arc<AccessControlService<PR>>,
        event_publisher: Arc<EP>,
    ) -> Self {
        Self {
            workflow_repo,
            access,
            event_publisher,
            default_required_approvals: 1,
        }
    }

    pub fn with_default_required_approvals(mut self, required_approvals: u32) -> Self {
        self.default_required_approvals = required_approvals.max(1);
        self
    }

    /// 创建工作流
    pub async fn handle_create(&self, cmd: CreateWorkflowCommand) -> AppResult<Workflow> {
        let result = self.create(cmd).await;
        record_outcome("create", &result);
        result
    }

    async fn create(&self, cmd: CreateWorkflowCommand) -> AppResult<Workflow> {
        cmd.validate()?;
        let actor = cmd.actor;
        let scope = self
            .access
            .authorize(&actor, resources::WORKFLOWS, Action::Create)
            .await?;

        let workflow = Workflow::new(NewWorkflow {
            title: cmd.title,
            description: cmd.description,
            workflow_type: cmd.workflow_type,
            priority: cmd.priority,
            assigned_to: cmd.assigned_to,
            site_id: cmd.site_id.or(actor.site_id),
            created_by: actor.id,
            due_date: cmd.due_date,
            required_approvals: cmd
                .required_approvals
                .unwrap_or(self.default_required_approvals),
        })?;
        ensure_creatable(&workflow, scope, &actor)?;

        let created = self.workflow_repo.create(&workflow).await?;
        info!(
            workflow_id = %created.id,
            status = %created.status,
            created_by = %actor.id,
            "Workflow created"
        );

        let event = WorkflowEvent::Created {
            workflow_id: created.id.0,
            workflow_type: created.workflow_type,
            status: created.status,
            site_id: created.site_id.map(|s| s.0),
            by: actor.id.0,
        };
        self.publish(event, created.version, &actor).await;
        Ok(created)
    }

    /// 指派执行人
    pub async fn handle_assign(&self, cmd: AssignWorkflowCommand) -> AppResult<Workflow> {
        let assignee = cmd.assignee;
        let actor = cmd.actor;
        self.apply("assign", &actor, cmd.workflow_id, |wf| {
            wf.assign(&actor, assignee)?;
            Ok(WorkflowEvent::Assigned {
                workflow_id: wf.id.0,
                assignee: assignee.0,
                by: actor.id.0,
            })
        })
        .await
    }

    /// 开始执行
    pub async fn handle_start(&self, cmd: StartWorkflowCommand) -> AppResult<Workflow> {
        let actor = cmd.actor;
        self.apply("start", &actor, cmd.workflow_id, |wf| {
            wf.start(&actor)?;
            Ok(WorkflowEvent::Started {
                workflow_id: wf.id.0,
                by: actor.id.0,
            })
        })
        .await
    }

    /// 完成执行
    pub async fn handle_complete(&self, cmd: CompleteWorkflowCommand) -> AppResult<Workflow> {
        let actor = cmd.actor;
        let notes = cmd.completion_notes;
        self.apply("complete", &actor, cmd.workflow_id, |wf| {
            wf.complete(&actor, notes)?;
            Ok(WorkflowEvent::Completed {
                workflow_id: wf.id.0,
                by: actor.id.0,
            })
        })
        .await
    }

    /// 审批 (按审批数门控)
    pub async fn handle_approve(&self, cmd: ApproveWorkflowCommand) -> AppResult<Workflow> {
        let actor = cmd.actor;
        self.apply("approve", &actor, cmd.workflow_id, |wf| {
            let approved = wf.approve(&actor)?;
            Ok(if approved {
                WorkflowEvent::Approved {
                    workflow_id: wf.id.0,
                    approval_count: wf.approval_count,
                    by: actor.id.0,
                }
            } else {
                WorkflowEvent::ApprovalRecorded {
                    workflow_id: wf.id.0,
                    approval_count: wf.approval_count,
                    required_approvals: wf.required_approvals,
                    by: actor.id.0,
                }
            })
        })
        .await
    }

    /// 驳回
    pub async fn handle_reject(&self, cmd: RejectWorkflowCommand) -> AppResult<Workflow> {
        if let Err(e) = cmd.validate() {
            let refused = Err(e);
            record_outcome("reject", &refused);
            return refused;
        }
        let actor = cmd.actor;
        let reason = cmd.reason;
        self.apply("reject", &actor, cmd.workflow_id, |wf| {
            wf.reject(&actor, &reason)?;
            Ok(WorkflowEvent::Rejected {
                workflow_id: wf.id.0,
                reason: reason.trim().to_string(),
                by: actor.id.0,
            })
        })
        .await
    }

    /// 创建人重新提交
    pub async fn handle_resubmit(&self, cmd: ResubmitWorkflowCommand) -> AppResult<Workflow> {
        let actor = cmd.actor;
        self.apply("resubmit", &actor, cmd.workflow_id, |wf| {
            wf.resubmit(&actor)?;
            Ok(WorkflowEvent::Resubmitted {
                workflow_id: wf.id.0,
                by: actor.id.0,
            })
        })
        .await
    }

    /// 删除 (已批准的工作流作为合规凭证保留)
    pub async fn handle_delete(&self, cmd: DeleteWorkflowCommand) -> AppResult<()> {
        let result = self.delete(cmd).await;
        record_outcome("delete", &result);
        result
    }

    async fn delete(&self, cmd: DeleteWorkflowCommand) -> AppResult<()> {
        let actor = cmd.actor;
        self.access
            .authorize(&actor, resources::WORKFLOWS, Action::Delete)
            .await?;
        let workflow = self.load(&cmd.workflow_id).await?;
        self.access
            .authorize_record(&actor, resources::WORKFLOWS, Action::Delete, &workflow)
            .await?;
        if workflow.status == WorkflowStatus::Approved {
            return Err(AppError::failed_precondition(format!(
                "Approved workflow {} cannot be deleted",
                workflow.id
            )));
        }

        self.workflow_repo.delete(&workflow.id).await?;
        info!(workflow_id = %workflow.id, by = %actor.id, "Workflow deleted");

        let event = WorkflowEvent::Deleted {
            workflow_id: workflow.id.0,
            by: actor.id.0,
        };
        self.publish(event, workflow.version, &actor).await;
        Ok(())
    }

    async fn load(&self, id: &WorkflowId) -> AppResult<Workflow> {
        self.workflow_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workflow {} not found", id)))
    }

    /// 加载、校验范围、执行转移、持久化并发布事件
    async fn apply<F>(
        &self,
        action: &'static str,
        actor: &ActingUser,
        id: WorkflowId,
        transition: F,
    ) -> AppResult<Workflow>
    where
        F: FnOnce(&mut Workflow) -> AppResult<WorkflowEvent> + Send,
    {
        let result: AppResult<Workflow> = async {
            let mut workflow = self.load(&id).await?;
            self.access
                .authorize_record(actor, resources::WORKFLOWS, Action::Update, &workflow)
                .await?;

            let from = workflow.status;
            let event = transition(&mut workflow)?;
            let updated = self.workflow_repo.update(&workflow).await?;

            info!(
                workflow_id = %updated.id,
                action,
                from = %from,
                to = %updated.status,
                by = %actor.id,
                "Workflow transition applied"
            );
            self.publish(event, updated.version, actor).await;
            Ok(updated)
        }
        .await;

        match &result {
            Err(e) if e.is_client_error() => {
                warn!(workflow_id = %id, action, error = %e, "Workflow transition refused");
            }
            Err(e) => {
                error!(workflow_id = %id, action, error = %e, "Workflow transition failed");
            }
            Ok(_) => {}
        }
        record_outcome(action, &result);
        result
    }

    /// 发布失败只记录日志，不影响已持久化的结果
    async fn publish(&self, event: WorkflowEvent, version: u64, actor: &ActingUser) {
        let topic = event.topic(EVENT_CONTEXT);
        let mut metadata = EventMetadata::new().with_user(actor.id.to_string());
        if let Some(site) = actor.site_id {
            metadata = metadata.with_site(site.to_string());
        }
        let envelope = EventEnvelope::new(event, version, metadata);

        if let Err(e) = self.event_publisher.publish(&topic, &envelope).await {
            warn!(topic = %topic, error = %e, "Failed to publish workflow event");
        }
    }
}

/// 新建记录必须落在创建人的范围内
fn ensure_creatable(workflow: &Workflow, scope: Scope, actor: &ActingUser) -> AppResult<()> {
    let allowed = match scope {
        Scope::All => true,
        Scope::Site => actor.site_id.is_some() && workflow.site_id == actor.site_id,
        Scope::Own => workflow.assigned_to.is_none_or(|a| a == actor.id),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "User {} cannot create workflows outside their {} scope",
            actor.id, scope
        )))
    }
}

fn record_outcome<T>(action: &'static str, result: &AppResult<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(AppError::Forbidden(_)) => "forbidden",
        Err(AppError::FailedPrecondition(_)) => "precondition_failed",
        Err(AppError::Validation(_)) => "invalid",
        Err(AppError::Conflict(_)) => "conflict",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    counter!("workflow_transitions_total", "action" => action, "outcome" => outcome).increment(1);
}
