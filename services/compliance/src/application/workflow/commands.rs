//! 工作流命令定义

use chrono::{DateTime, Utc};
use hse_common::{SiteId, UserId};
use hse_domain_core::LocalizedText;
use hse_errors::{AppError, AppResult};

use crate::domain::access::ActingUser;
use crate::domain::workflow::{Priority, WorkflowId, WorkflowType};

/// 标题在任一语言下的最大长度
const MAX_TITLE_LEN: usize = 200;

/// 创建工作流命令
#[derive(Debug, Clone)]
pub struct CreateWorkflowCommand {
    pub actor: ActingUser,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub workflow_type: WorkflowType,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    /// 缺省为创建人所在站点
    pub site_id: Option<SiteId>,
    pub due_date: Option<DateTime<Utc>>,
    /// 缺省使用配置的默认审批数
    pub required_approvals: Option<u32>,
}

impl CreateWorkflowCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.is_blank() {
            return Err(AppError::validation("Workflow title cannot be empty"));
        }
        for text in [&self.title.en, &self.title.ar, &self.title.fr] {
            if text.chars().count() > MAX_TITLE_LEN {
                return Err(AppError::validation(format!(
                    "Workflow title cannot exceed {} characters",
                    MAX_TITLE_LEN
                )));
            }
        }
        if self.required_approvals == Some(0) {
            return Err(AppError::validation(
                "Workflow requires at least one approval",
            ));
        }
        Ok(())
    }
}

/// 指派 (或改派) 执行人
#[derive(Debug, Clone)]
pub struct AssignWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
    pub assignee: UserId,
}

#[derive(Debug, Clone)]
pub struct StartWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
}

#[derive(Debug, Clone)]
pub struct CompleteWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
    pub completion_notes: LocalizedText,
}

#[derive(Debug, Clone)]
pub struct ApproveWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
}

/// 驳回命令，理由在访问存储之前校验
#[derive(Debug, Clone)]
pub struct RejectWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
    pub reason: String,
}

impl RejectWorkflowCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.reason.trim().is_empty() {
            return Err(AppError::validation("Rejection reason cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ResubmitWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
}

#[derive(Debug, Clone)]
pub struct DeleteWorkflowCommand {
    pub actor: ActingUser,
    pub workflow_id: WorkflowId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::RoleCode;

    fn actor() -> ActingUser {
        ActingUser::new(2, RoleCode::Manager, Some(SiteId(1)))
    }

    #[test]
    fn test_reject_reason_required() {
        let cmd = RejectWorkflowCommand {
            actor: actor(),
            workflow_id: WorkflowId(1),
            reason: "".to_string(),
        };
        assert!(matches!(cmd.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_validation() {
        let mut cmd = CreateWorkflowCommand {
            actor: actor(),
            title: LocalizedText::new("Cold room temperature log", "", ""),
            description: LocalizedText::default(),
            workflow_type: WorkflowType::EquipmentCheck,
            priority: Priority::Medium,
            assigned_to: None,
            site_id: None,
            due_date: None,
            required_approvals: None,
        };
        assert!(cmd.validate().is_ok());

        cmd.required_approvals = Some(0);
        assert!(cmd.validate().is_err());

        cmd.required_approvals = Some(2);
        cmd.title.fr = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(cmd.validate().is_err());
    }
}
