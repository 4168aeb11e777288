//! 工作流枚举与状态转移表

use serde::{Deserialize, Serialize};

/// 工作流状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Assigned,
    InProgress,
    Completed,
    Approved,
    Rejected,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::Draft,
        WorkflowStatus::Assigned,
        WorkflowStatus::InProgress,
        WorkflowStatus::Completed,
        WorkflowStatus::Approved,
        WorkflowStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Assigned => "assigned",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Rejected => "rejected",
        }
    }

    /// 仍需执行人处理 (用于逾期判断)
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Draft | WorkflowStatus::Assigned | WorkflowStatus::InProgress
        )
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown workflow status: {}", s))
    }
}

/// 工作流类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    SafetyInspection,
    FireSafety,
    EquipmentCheck,
    ComplianceAudit,
    IncidentReport,
}

impl WorkflowType {
    pub const ALL: [WorkflowType; 5] = [
        WorkflowType::SafetyInspection,
        WorkflowType::FireSafety,
        WorkflowType::EquipmentCheck,
        WorkflowType::ComplianceAudit,
        WorkflowType::IncidentReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::SafetyInspection => "safety_inspection",
            WorkflowType::FireSafety => "fire_safety",
            WorkflowType::EquipmentCheck => "equipment_check",
            WorkflowType::ComplianceAudit => "compliance_audit",
            WorkflowType::IncidentReport => "incident_report",
        }
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown workflow type: {}", s))
    }
}

/// 优先级
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown priority: {}", s))
    }
}

/// 工作流操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Assign,
    Start,
    Complete,
    Approve,
    Reject,
    Resubmit,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 6] = [
        WorkflowAction::Assign,
        WorkflowAction::Start,
        WorkflowAction::Complete,
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::Resubmit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Assign => "assign",
            WorkflowAction::Start => "start",
            WorkflowAction::Complete => "complete",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Resubmit => "resubmit",
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状态转移表 (当前状态 × 操作 → 目标状态)
///
/// `Approve` 的目标是审批数达标后的状态；未达标时工作流停留在 `Completed`
pub fn transition(from: WorkflowStatus, action: WorkflowAction) -> Option<WorkflowStatus> {
    use WorkflowAction as A;
    use WorkflowStatus as S;

    match (from, action) {
        (S::Draft | S::Assigned, A::Assign) => Some(S::Assigned),
        (S::Assigned, A::Start) => Some(S::InProgress),
        (S::InProgress, A::Complete) => Some(S::Completed),
        (S::Completed, A::Approve) => Some(S::Approved),
        (S::Completed, A::Reject) => Some(S::Rejected),
        (S::Rejected, A::Resubmit) => Some(S::Draft),
        _ => None,
    }
}
