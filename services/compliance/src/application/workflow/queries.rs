//! 工作流查询结果 (按语言展开的视图)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hse_common::{SiteId, UserId};
use hse_domain_core::Language;
use serde::{Deserialize, Serialize};

use crate::domain::workflow::{
    Priority, Workflow, WorkflowAction, WorkflowId, WorkflowStatus, WorkflowType,
};

/// 工作流展示视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowView {
    pub id: WorkflowId,
    pub title: String,
    pub description: String,
    pub workflow_type: WorkflowType,
    pub status: WorkflowStatus,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub assignee_name: Option<String>,
    pub site_id: Option<SiteId>,
    pub site_name: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub required_approvals: u32,
    pub approval_count: u32,
    pub completion_percentage: u8,
    pub completion_notes: String,
    pub rejection_reason: Option<String>,
    /// 当前用户可执行的操作
    pub available_actions: Vec<WorkflowAction>,
    pub is_overdue: bool,
    pub language: Language,
    /// 从右到左排版 (阿拉伯语)
    pub rtl: bool,
    pub version: u64,
}

impl WorkflowView {
    pub(crate) fn build(
        workflow: &Workflow,
        lang: Language,
        assignee_name: Option<String>,
        site_name: Option<String>,
        available_actions: Vec<WorkflowAction>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: workflow.id,
            title: workflow.title.pick(lang).to_string(),
            description: workflow.description.pick(lang).to_string(),
            workflow_type: workflow.workflow_type,
            status: workflow.status,
            priority: workflow.priority,
            assigned_to: workflow.assigned_to,
            assignee_name,
            site_id: workflow.site_id,
            site_name,
            due_date: workflow.due_date,
            required_approvals: workflow.required_approvals,
            approval_count: workflow.approval_count,
            completion_percentage: workflow.completion_percentage,
            completion_notes: workflow.completion_notes.pick(lang).to_string(),
            rejection_reason: workflow.rejection_reason.clone(),
            available_actions,
            is_overdue: workflow.is_overdue(now),
            language: lang,
            rtl: lang.is_rtl(),
            version: workflow.version,
        }
    }
}

/// 仪表盘统计 (仅统计可见记录)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub total: u64,
    pub by_status: BTreeMap<WorkflowStatus, u64>,
    pub overdue: u64,
    pub awaiting_approval: u64,
}

impl WorkflowStats {
    pub(crate) fn record(&mut self, workflow: &Workflow, now: DateTime<Utc>) {
        self.total += 1;
        *self.by_status.entry(workflow.status).or_default() += 1;
        if workflow.is_overdue(now) {
            self.overdue += 1;
        }
        if workflow.is_awaiting_approval() {
            self.awaiting_approval += 1;
        }
    }

    pub fn count(&self, status: WorkflowStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
