//! 工作流领域事件

use hse_event_core::DomainEvent;
use serde::{Deserialize, Serialize};

use super::status::{WorkflowStatus, WorkflowType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Created {
        workflow_id: i64,
        workflow_type: WorkflowType,
        status: WorkflowStatus,
        site_id: Option<i64>,
        by: i64,
    },
    Assigned {
        workflow_id: i64,
        assignee: i64,
        by: i64,
    },
    Started {
        workflow_id: i64,
        by: i64,
    },
    Completed {
        workflow_id: i64,
        by: i64,
    },
    /// 记录了一次审批但尚未达到所需数量
    ApprovalRecorded {
        workflow_id: i64,
        approval_count: u32,
        required_approvals: u32,
        by: i64,
    },
    Approved {
        workflow_id: i64,
        approval_count: u32,
        by: i64,
    },
    Rejected {
        workflow_id: i64,
        reason: String,
        by: i64,
    },
    Resubmitted {
        workflow_id: i64,
        by: i64,
    },
    Deleted {
        workflow_id: i64,
        by: i64,
    },
}

impl WorkflowEvent {
    pub fn workflow_id(&self) -> i64 {
        match self {
            WorkflowEvent::Created { workflow_id, .. }
            | WorkflowEvent::Assigned { workflow_id, .. }
            | WorkflowEvent::Started { workflow_id, .. }
            | WorkflowEvent::Completed { workflow_id, .. }
            | WorkflowEvent::ApprovalRecorded { workflow_id, .. }
            | WorkflowEvent::Approved { workflow_id, .. }
            | WorkflowEvent::Rejected { workflow_id, .. }
            | WorkflowEvent::Resubmitted { workflow_id, .. }
            | WorkflowEvent::Deleted { workflow_id, .. } => *workflow_id,
        }
    }
}

impl DomainEvent for WorkflowEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::Created { .. } => "created",
            WorkflowEvent::Assigned { .. } => "assigned",
            WorkflowEvent::Started { .. } => "started",
            WorkflowEvent::Completed { .. } => "completed",
            WorkflowEvent::ApprovalRecorded { .. } => "approval_recorded",
            WorkflowEvent::Approved { .. } => "approved",
            WorkflowEvent::Rejected { .. } => "rejected",
            WorkflowEvent::Resubmitted { .. } => "resubmitted",
            WorkflowEvent::Deleted { .. } => "deleted",
        }
    }

    fn aggregate_type(&self) -> &'static str {
        "workflow"
    }

    fn aggregate_id(&self) -> String {
        self.workflow_id().to_string()
    }
}
