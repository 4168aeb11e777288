//! 记录存储权限仓储实现

use std::sync::Arc;

use async_trait::async_trait;
use hse_errors::{AppError, AppResult};
use hse_ports::{
    Condition, FetchQuery, ID_FIELD, Record, RecordStore, SortDirection, get_bool, get_string,
    lookup_id, record_id,
};
use serde_json::Value;

use super::paging::fetch_all;
use super::schema::{parse_column, permission_c};
use crate::domain::access::{Permission, PermissionId, PermissionRepository, RoleId};

pub struct RecordStorePermissionRepository<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> RecordStorePermissionRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn fetch(&self, query: FetchQuery) -> AppResult<Vec<Permission>> {
        let query = query.fields(permission_c::fields());
        fetch_all(self.store.as_ref(), permission_c::TABLE, query, permission_from_record).await
    }
}

fn permission_from_record(record: &Record) -> AppResult<Permission> {
    let id = record_id(record)
        .ok_or_else(|| AppError::internal("Permission record without Id"))?;
    let role_id = lookup_id(record, permission_c::ROLE_ID).ok_or_else(|| {
        AppError::internal(format!("Permission {} has no role reference", id))
    })?;

    Ok(Permission {
        id: PermissionId(id),
        role_id: RoleId(role_id),
        role_code: parse_column(record, permission_c::ROLE_CODE)?,
        resource: get_string(record, permission_c::RESOURCE),
        action: parse_column(record, permission_c::ACTION)?,
        scope: parse_column(record, permission_c::SCOPE)?,
        // 缺失视为拒绝
        allowed: get_bool(record, permission_c::ALLOWED).unwrap_or(false),
    })
}

fn permission_to_record(permission: &Permission, with_id: bool) -> Record {
    let mut record = Record::new();
    if with_id {
        record.insert(ID_FIELD.to_string(), Value::from(permission.id.0));
    }
    record.insert(
        permission_c::ROLE_ID.to_string(),
        Value::from(permission.role_id.0),
    );
    record.insert(
        permission_c::ROLE_CODE.to_string(),
        Value::from(permission.role_code.as_str()),
    );
    record.insert(
        permission_c::RESOURCE.to_string(),
        Value::from(permission.resource.as_str()),
    );
    record.insert(
        permission_c::ACTION.to_string(),
        Value::from(permission.action.as_str()),
    );
    record.insert(
        permission_c::SCOPE.to_string(),
        Value::from(permission.scope.as_str()),
    );
    record.insert(
        permission_c::ALLOWED.to_string(),
        Value::from(permission.allowed),
    );
    record
}

#[async_trait]
impl<S: RecordStore> PermissionRepository for RecordStorePermissionRepository<S> {
    async fn list_all(&self) -> AppResult<Vec<Permission>> {
        self.fetch(FetchQuery::new().order_by(ID_FIELD, SortDirection::Asc))
            .await
    }

    async fn list_by_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let query = FetchQuery::new()
            .filter(Condition::equal_to(permission_c::ROLE_ID, role_id.0))
            .order_by(permission_c::RESOURCE, SortDirection::Asc);
        self.fetch(query).await
    }

    async fn find_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        self.store
            .get_record_by_id(permission_c::TABLE, id.0, &permission_c::fields())
            .await?
            .into_data()?
            .as_ref()
            .map(permission_from_record)
            .transpose()
    }

    async fn create(&self, permissions: &[Permission]) -> AppResult<Vec<Permission>> {
        if permissions.is_empty() {
            return Ok(Vec::new());
        }
        let records = permissions
            .iter()
            .map(|p| permission_to_record(p, false))
            .collect();
        let created = self
            .store
            .create_records(permission_c::TABLE, records)
            .await?
            .into_all()?;

        created
            .into_iter()
            .map(|data| {
                data.as_ref()
                    .ok_or_else(|| {
                        AppError::external_service("Record store returned no permission data")
                    })
                    .and_then(permission_from_record)
            })
            .collect()
    }

    async fn update(&self, permission: &Permission) -> AppResult<Permission> {
        self.store
            .update_records(
                permission_c::TABLE,
                vec![permission_to_record(permission, true)],
            )
            .await?
            .ensure_success()?;
        Ok(permission.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{Action, RoleCode, Scope};
    use serde_json::json;

    #[test]
    fn test_permission_from_record_with_lookup_role() {
        let record = match json!({
            "Id": 12,
            "role_id_c": {"Id": 2, "Name": "Manager"},
            "role_code_c": "manager",
            "resource_c": "workflows",
            "action_c": "update",
            "scope_c": "site",
            "allowed_c": true
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let permission = permission_from_record(&record).unwrap();
        assert_eq!(permission.id, PermissionId(12));
        assert_eq!(permission.role_id, RoleId(2));
        assert_eq!(permission.role_code, RoleCode::Manager);
        assert_eq!(permission.action, Action::Update);
        assert_eq!(permission.scope, Scope::Site);
        assert!(permission.allowed);
        assert_eq!(permission.code(), "workflows:update");
    }

    #[test]
    fn test_missing_allowed_flag_denies() {
        let mut record = permission_to_record(
            &Permission {
                id: PermissionId(3),
                role_id: RoleId(1),
                role_code: RoleCode::User,
                resource: "settings".to_string(),
                action: Action::Read,
                scope: Scope::Own,
                allowed: true,
            },
            true,
        );
        record.remove("allowed_c");
        assert!(!permission_from_record(&record).unwrap().allowed);
    }
}
