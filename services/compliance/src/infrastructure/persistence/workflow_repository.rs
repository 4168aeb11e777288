//! 记录存储工作流仓储实现
//!
//! 更新时先读取存储中的 `version_c` 再写入，两步之间不加锁

use std::sync::Arc;

use async_trait::async_trait;
use hse_common::{AuditInfo, PagedResult, Pagination, SiteId, UserId};
use hse_errors::{AppError, AppResult};
use hse_ports::{
    Condition, ConditionGroup, FetchQuery, ID_FIELD, Record, RecordStore, SortDirection,
    datetime_value, get_datetime, get_i64, get_str, lookup_id, record_id,
};
use serde_json::Value;
use tracing::debug;

use super::schema::{parse_column, workflow_c};
use crate::domain::workflow::{Workflow, WorkflowFilter, WorkflowId, WorkflowRepository};

pub struct RecordStoreWorkflowRepository<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> RecordStoreWorkflowRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn stored_version(&self, id: &WorkflowId) -> AppResult<u64> {
        let record = self
            .store
            .get_record_by_id(workflow_c::TABLE, id.0, &[workflow_c::VERSION.to_string()])
            .await?
            .into_data()?
            .ok_or_else(|| AppError::not_found(format!("Workflow {} not found", id)))?;
        Ok(version_of(&record))
    }
}

fn version_of(record: &Record) -> u64 {
    get_i64(record, workflow_c::VERSION)
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(0)
}

fn filter_query(filter: &WorkflowFilter) -> FetchQuery {
    let mut query = FetchQuery::new();
    if let Some(status) = filter.status {
        query = query.filter(Condition::equal_to(workflow_c::STATUS, status.as_str()));
    }
    if let Some(workflow_type) = filter.workflow_type {
        query = query.filter(Condition::equal_to(workflow_c::TYPE, workflow_type.as_str()));
    }
    if let Some(priority) = filter.priority {
        query = query.filter(Condition::equal_to(workflow_c::PRIORITY, priority.as_str()));
    }
    if let Some(site_id) = filter.site_id {
        query = query.filter(Condition::equal_to(workflow_c::SITE_ID, site_id.0));
    }
    if let Some(assigned_to) = filter.assigned_to {
        query = query.filter(Condition::equal_to(workflow_c::ASSIGNED_TO, assigned_to.0));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.group(ConditionGroup::any(
            workflow_c::TITLE
                .names()
                .into_iter()
                .map(|column| Condition::contains(column, search))
                .collect(),
        ));
    }
    query
}

fn parse_approvers(raw: Option<&str>) -> Vec<UserId> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

fn format_approvers(approvers: &[UserId]) -> String {
    approvers
        .iter()
        .map(UserId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn count_column(record: &Record, column: &str) -> u32 {
    get_i64(record, column)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

pub(crate) fn workflow_from_record(record: &Record) -> AppResult<Workflow> {
    let id = record_id(record)
        .ok_or_else(|| AppError::internal("Workflow record without Id"))?;
    let created_by = lookup_id(record, workflow_c::CREATED_BY)
        .map(UserId)
        .ok_or_else(|| AppError::internal(format!("Workflow {} has no creator", id)))?;

    let created_at = get_datetime(record, workflow_c::CREATED_AT)?;
    let updated_at = get_datetime(record, workflow_c::UPDATED_AT)?;
    let mut audit_info = AuditInfo::new(Some(created_by));
    if let Some(created_at) = created_at {
        audit_info.created_at = created_at;
        audit_info.updated_at = created_at;
    }
    if let Some(updated_at) = updated_at {
        audit_info.updated_at = updated_at;
    }
    audit_info.updated_by = lookup_id(record, workflow_c::UPDATED_BY)
        .map(UserId)
        .or(Some(created_by));

    Ok(Workflow {
        id: WorkflowId(id),
        title: workflow_c::TITLE.read(record),
        description: workflow_c::DESCRIPTION.read(record),
        workflow_type: parse_column(record, workflow_c::TYPE)?,
        status: parse_column(record, workflow_c::STATUS)?,
        priority: parse_column(record, workflow_c::PRIORITY)?,
        assigned_to: lookup_id(record, workflow_c::ASSIGNED_TO).map(UserId),
        site_id: lookup_id(record, workflow_c::SITE_ID).map(SiteId),
        created_by,
        due_date: get_datetime(record, workflow_c::DUE_DATE)?,
        required_approvals: count_column(record, workflow_c::REQUIRED_APPROVALS).max(1),
        approval_count: count_column(record, workflow_c::APPROVAL_COUNT),
        approved_by: parse_approvers(get_str(record, workflow_c::APPROVED_BY)),
        assigned_at: get_datetime(record, workflow_c::ASSIGNED_AT)?,
        started_at: get_datetime(record, workflow_c::STARTED_AT)?,
        completed_at: get_datetime(record, workflow_c::COMPLETED_AT)?,
        approved_at: get_datetime(record, workflow_c::APPROVED_AT)?,
        rejected_at: get_datetime(record, workflow_c::REJECTED_AT)?,
        rejected_by: lookup_id(record, workflow_c::REJECTED_BY).map(UserId),
        rejection_reason: get_str(record, workflow_c::REJECTION_REASON)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
        completion_percentage: get_i64(record, workflow_c::COMPLETION_PERCENTAGE)
            .map_or(0, |v| v.clamp(0, 100) as u8),
        completion_notes: workflow_c::COMPLETION_NOTES.read(record),
        version: version_of(record),
        audit_info,
    })
}

fn optional_id(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

pub(crate) fn workflow_to_record(
    workflow: &Workflow,
    id: Option<WorkflowId>,
    version: u64,
) -> Record {
    let mut record = Record::new();
    if let Some(id) = id {
        record.insert(ID_FIELD.to_string(), Value::from(id.0));
    }
    workflow_c::TITLE.write(&mut record, &workflow.title);
    workflow_c::DESCRIPTION.write(&mut record, &workflow.description);
    workflow_c::COMPLETION_NOTES.write(&mut record, &workflow.completion_notes);

    let columns = [
        (workflow_c::TYPE, Value::from(workflow.workflow_type.as_str())),
        (workflow_c::STATUS, Value::from(workflow.status.as_str())),
        (workflow_c::PRIORITY, Value::from(workflow.priority.as_str())),
        (workflow_c::ASSIGNED_TO, optional_id(workflow.assigned_to.map(|u| u.0))),
        (workflow_c::SITE_ID, optional_id(workflow.site_id.map(|s| s.0))),
        (workflow_c::CREATED_BY, Value::from(workflow.created_by.0)),
        (workflow_c::DUE_DATE, datetime_value(workflow.due_date)),
        (workflow_c::REQUIRED_APPROVALS, Value::from(workflow.required_approvals)),
        (workflow_c::APPROVAL_COUNT, Value::from(workflow.approval_count)),
        (workflow_c::APPROVED_BY, Value::from(format_approvers(&workflow.approved_by))),
        (workflow_c::ASSIGNED_AT, datetime_value(workflow.assigned_at)),
        (workflow_c::STARTED_AT, datetime_value(workflow.started_at)),
        (workflow_c::COMPLETED_AT, datetime_value(workflow.completed_at)),
        (workflow_c::APPROVED_AT, datetime_value(workflow.approved_at)),
        (workflow_c::REJECTED_AT, datetime_value(workflow.rejected_at)),
        (workflow_c::REJECTED_BY, optional_id(workflow.rejected_by.map(|u| u.0))),
        (
            workflow_c::REJECTION_REASON,
            workflow.rejection_reason.clone().map_or(Value::Null, Value::from),
        ),
        (
            workflow_c::COMPLETION_PERCENTAGE,
            Value::from(workflow.completion_percentage),
        ),
        (workflow_c::VERSION, Value::from(version)),
        (
            workflow_c::CREATED_AT,
            datetime_value(Some(workflow.audit_info.created_at)),
        ),
        (
            workflow_c::UPDATED_AT,
            datetime_value(Some(workflow.audit_info.updated_at)),
        ),
        (
            workflow_c::UPDATED_BY,
            optional_id(workflow.audit_info.updated_by.map(|u| u.0)),
        ),
    ];
    for (column, value) in columns {
        record.insert(column.to_string(), value);
    }
    record
}

#[async_trait]
impl<S: RecordStore> WorkflowRepository for RecordStoreWorkflowRepository<S> {
    async fn find_by_id(&self, id: &WorkflowId) -> AppResult<Option<Workflow>> {
        self.store
            .get_record_by_id(workflow_c::TABLE, id.0, &workflow_c::fields())
            .await?
            .into_data()?
            .as_ref()
            .map(workflow_from_record)
            .transpose()
    }

    async fn list(
        &self,
        filter: &WorkflowFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Workflow>> {
        let query = filter_query(filter)
            .fields(workflow_c::fields())
            .order_by(ID_FIELD, SortDirection::Desc)
            .paging(pagination.page_size, pagination.offset());

        let response = self.store.fetch_records(workflow_c::TABLE, &query).await?;
        let total = response.total;
        let items = response
            .into_records()?
            .iter()
            .map(workflow_from_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(count = items.len(), ?total, "Listed workflows");

        Ok(match total {
            Some(total) => PagedResult::new(items, total, pagination),
            None => PagedResult::open_ended(items, pagination),
        })
    }

    async fn create(&self, workflow: &Workflow) -> AppResult<Workflow> {
        let record = workflow_to_record(workflow, None, workflow.version);
        let created = self
            .store
            .create_records(workflow_c::TABLE, vec![record])
            .await?
            .into_single()?;

        let id = record_id(&created)
            .ok_or_else(|| AppError::external_service("Record store returned no workflow Id"))?;
        Ok(Workflow {
            id: WorkflowId(id),
            ..workflow.clone()
        })
    }

    async fn update(&self, workflow: &Workflow) -> AppResult<Workflow> {
        let stored = self.stored_version(&workflow.id).await?;
        if stored != workflow.version {
            return Err(AppError::conflict(format!(
                "Workflow {} was modified concurrently (expected version {}, found {})",
                workflow.id, workflow.version, stored
            )));
        }

        let next_version = workflow.version + 1;
        let record = workflow_to_record(workflow, Some(workflow.id), next_version);
        self.store
            .update_records(workflow_c::TABLE, vec![record])
            .await?
            .ensure_success()?;

        Ok(Workflow {
            version: next_version,
            ..workflow.clone()
        })
    }

    async fn delete(&self, id: &WorkflowId) -> AppResult<()> {
        self.store
            .delete_records(workflow_c::TABLE, &[id.0])
            .await?
            .ensure_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{NewWorkflow, Priority, WorkflowStatus, WorkflowType};
    use hse_domain_core::LocalizedText;
    use hse_ports::Operator;
    use serde_json::json;

    fn sample() -> Workflow {
        let mut workflow = Workflow::new(NewWorkflow {
            title: LocalizedText::new(
                "Kitchen hygiene audit",
                "تدقيق نظافة المطبخ",
                "Audit hygiène cuisine",
            ),
            description: LocalizedText::uniform("HACCP"),
            workflow_type: WorkflowType::ComplianceAudit,
            priority: Priority::High,
            assigned_to: Some(UserId(7)),
            site_id: Some(SiteId(2)),
            created_by: UserId(3),
            due_date: None,
            required_approvals: 2,
        })
        .unwrap();
        workflow.id = WorkflowId(11);
        workflow.approved_by = vec![UserId(3), UserId(4)];
        workflow.approval_count = 2;
        workflow
    }

    #[test]
    fn test_workflow_record_mapping() {
        let workflow = sample();
        let record = workflow_to_record(&workflow, Some(workflow.id), 5);

        assert_eq!(record.get("approved_by_c"), Some(&json!("3,4")));
        assert_eq!(record.get("status_c"), Some(&json!("assigned")));
        assert_eq!(record.get("version_c"), Some(&json!(5)));

        let decoded = workflow_from_record(&record).unwrap();
        assert_eq!(decoded.id, WorkflowId(11));
        assert_eq!(decoded.title, workflow.title);
        assert_eq!(decoded.status, WorkflowStatus::Assigned);
        assert_eq!(decoded.assigned_to, Some(UserId(7)));
        assert_eq!(decoded.approved_by, vec![UserId(3), UserId(4)]);
        assert_eq!(decoded.required_approvals, 2);
        assert_eq!(decoded.version, 5);
    }

    #[test]
    fn test_lookup_columns_are_decoded() {
        let mut record = workflow_to_record(&sample(), Some(WorkflowId(11)), 0);
        record.insert("assigned_to_c".to_string(), json!({"Id": 9, "Name": "Youssef"}));
        record.insert("site_id_c".to_string(), json!("4"));

        let decoded = workflow_from_record(&record).unwrap();
        assert_eq!(decoded.assigned_to, Some(UserId(9)));
        assert_eq!(decoded.site_id, Some(SiteId(4)));
    }

    #[test]
    fn test_filter_query_conditions() {
        let filter = WorkflowFilter {
            status: Some(WorkflowStatus::Completed),
            site_id: Some(SiteId(2)),
            search: Some("  audit ".to_string()),
            ..Default::default()
        };
        let query = filter_query(&filter);

        assert_eq!(query.conditions.len(), 2);
        assert_eq!(query.groups.len(), 1);
        assert_eq!(query.groups[0].conditions.len(), 3);
        assert!(query.groups[0]
            .conditions
            .iter()
            .all(|c| c.operator == Operator::Contains && c.values == vec![json!("audit")]));
    }
}
