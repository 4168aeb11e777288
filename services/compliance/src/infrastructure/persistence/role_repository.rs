//! 记录存储角色仓储实现

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hse_common::AuditInfo;
use hse_errors::{AppError, AppResult};
use hse_ports::{
    Condition, FetchQuery, ID_FIELD, Record, RecordStore, SortDirection, datetime_value,
    get_bool, get_datetime, record_id,
};
use serde_json::Value;

use super::paging::fetch_all;
use super::schema::{parse_column, role_c};
use crate::domain::access::{Role, RoleCode, RoleId, RoleRepository};

pub struct RecordStoreRoleRepository<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> RecordStoreRoleRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn fetch(&self, query: FetchQuery) -> AppResult<Vec<Role>> {
        let query = query.fields(role_c::fields());
        fetch_all(self.store.as_ref(), role_c::TABLE, query, role_from_record).await
    }
}

fn role_from_record(record: &Record) -> AppResult<Role> {
    let id = record_id(record)
        .ok_or_else(|| AppError::internal("Role record without Id"))?;
    let now = Utc::now();
    let created_at = get_datetime(record, role_c::CREATED_AT)?.unwrap_or(now);
    let updated_at = get_datetime(record, role_c::UPDATED_AT)?.unwrap_or(created_at);

    Ok(Role {
        id: RoleId(id),
        name: role_c::NAME.read(record),
        code: parse_column::<RoleCode>(record, role_c::CODE)?,
        scope_level: parse_column(record, role_c::SCOPE_LEVEL)?,
        is_system_role: get_bool(record, role_c::IS_SYSTEM_ROLE).unwrap_or(false),
        audit_info: AuditInfo {
            created_at,
            created_by: None,
            updated_at,
            updated_by: None,
        },
    })
}

fn role_to_record(role: &Role, with_id: bool) -> Record {
    let mut record = Record::new();
    if with_id {
        record.insert(ID_FIELD.to_string(), Value::from(role.id.0));
    }
    role_c::NAME.write(&mut record, &role.name);
    record.insert(role_c::CODE.to_string(), Value::from(role.code.as_str()));
    record.insert(
        role_c::SCOPE_LEVEL.to_string(),
        Value::from(role.scope_level.as_str()),
    );
    record.insert(
        role_c::IS_SYSTEM_ROLE.to_string(),
        Value::from(role.is_system_role),
    );
    record.insert(
        role_c::CREATED_AT.to_string(),
        datetime_value(Some(role.audit_info.created_at)),
    );
    record.insert(
        role_c::UPDATED_AT.to_string(),
        datetime_value(Some(role.audit_info.updated_at)),
    );
    record
}

#[async_trait]
impl<S: RecordStore> RoleRepository for RecordStoreRoleRepository<S> {
    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        self.store
            .get_record_by_id(role_c::TABLE, id.0, &role_c::fields())
            .await?
            .into_data()?
            .as_ref()
            .map(role_from_record)
            .transpose()
    }

    async fn find_by_code(&self, code: RoleCode) -> AppResult<Option<Role>> {
        let query = FetchQuery::new()
            .filter(Condition::equal_to(role_c::CODE, code.as_str()))
            .order_by(ID_FIELD, SortDirection::Asc);
        Ok(self.fetch(query).await?.into_iter().next())
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        self.fetch(FetchQuery::new().order_by(ID_FIELD, SortDirection::Asc))
            .await
    }

    async fn create(&self, role: &Role) -> AppResult<Role> {
        let created = self
            .store
            .create_records(role_c::TABLE, vec![role_to_record(role, false)])
            .await?
            .into_single()?;
        role_from_record(&created)
    }

    async fn update(&self, role: &Role) -> AppResult<Role> {
        self.store
            .update_records(role_c::TABLE, vec![role_to_record(role, true)])
            .await?
            .ensure_success()?;
        Ok(role.clone())
    }
}
