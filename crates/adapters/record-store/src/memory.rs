//! 进程内记录存储
//!
//! 语义与远程记录 API 保持一致：自增主键、字段投影、条件/排序/分页、
//! 合并式更新、逐条结果与字段级错误。批量写入先整体校验，任一记录
//! 不合法时整批不落地。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hse_common::{HealthCheck, HealthCheckResult};
use hse_errors::{AppError, AppResult};
use hse_ports::{
    BatchResponse, FetchQuery, FetchResponse, FieldError, ID_FIELD, Record, RecordId,
    RecordResponse, RecordResult, RecordStore, record_id,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::query;

#[derive(Debug, Default)]
struct Table {
    next_id: RecordId,
    rows: BTreeMap<RecordId, Record>,
}

impl Table {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

/// 内存存储统计
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreDetails {
    pub tables: usize,
    pub records: usize,
}

/// 进程内记录存储
#[derive(Debug)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Table>>,
    required_fields: RwLock<HashMap<String, Vec<String>>>,
    available: AtomicBool,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            required_fields: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// 声明表的必填字段，写入时由存储端校验
    pub fn with_required_fields<I, S>(self, table: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields
            .write()
            .insert(table.to_string(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// 模拟存储不可用 (连接中断、客户端未初始化)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// 直接写入记录 (绕过校验)，返回分配的主键
    pub fn insert(&self, table: &str, mut record: Record) -> RecordId {
        let mut tables = self.tables.write();
        let table = tables.entry(table.to_string()).or_default();
        let id = table.allocate_id();
        record.insert(ID_FIELD.to_string(), Value::from(id));
        table.rows.insert(id, record);
        id
    }

    /// 读取原始记录
    pub fn snapshot(&self, table: &str, id: RecordId) -> Option<Record> {
        self.tables
            .read()
            .get(table)
            .and_then(|t| t.rows.get(&id).cloned())
    }

    /// 表内记录数
    pub fn count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AppError::external_service("Record store is unavailable"))
        }
    }

    /// 必填字段校验；`partial` 为更新时只检查本次写入的字段
    fn validate(&self, table: &str, record: &Record, partial: bool) -> Vec<FieldError> {
        let required = self.required_fields.read();
        let Some(fields) = required.get(table) else {
            return Vec::new();
        };
        fields
            .iter()
            .filter(|field| !partial || record.contains_key(field.as_str()))
            .filter(|field| is_empty_value(record.get(field.as_str())))
            .map(|field| FieldError {
                field_label: field.clone(),
                message: "is required".to_string(),
            })
            .collect()
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// 整批校验结果：全部合法时为 `None`
fn batch_rejection(checks: &[Result<(), RecordResult>]) -> Option<BatchResponse> {
    if checks.iter().all(Result::is_ok) {
        return None;
    }
    let results = checks
        .iter()
        .map(|check| match check {
            Ok(()) => RecordResult::failed("Batch rejected"),
            Err(result) => result.clone(),
        })
        .collect();
    Some(BatchResponse::from_results(results))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_records(&self, table: &str, query: &FetchQuery) -> AppResult<FetchResponse> {
        self.ensure_available()?;

        let tables = self.tables.read();
        let mut rows: Vec<Record> = tables
            .get(table)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|r| query::matches(r, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        query::sort(&mut rows, query);
        let total = rows.len() as u64;
        let (offset, limit) = query
            .paging_info
            .map_or((0, usize::MAX), |p| (p.offset as usize, p.limit as usize));

        let data = rows
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| query::project(r, &query.fields))
            .collect();

        debug!(table, total, "Fetched records");
        Ok(FetchResponse::ok(data, total))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> AppResult<RecordResponse> {
        self.ensure_available()?;

        let data = self
            .tables
            .read()
            .get(table)
            .and_then(|t| t.rows.get(&id))
            .map(|r| query::project(r, fields));

        Ok(RecordResponse {
            success: true,
            data,
            message: None,
        })
    }

    async fn create_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        self.ensure_available()?;

        let checks: Vec<Result<(), RecordResult>> = records
            .iter()
            .map(|r| {
                let errors = self.validate(table, r, false);
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(RecordResult::invalid(errors))
                }
            })
            .collect();
        if let Some(rejection) = batch_rejection(&checks) {
            return Ok(rejection);
        }

        let mut tables = self.tables.write();
        let t = tables.entry(table.to_string()).or_default();
        let results = records
            .into_iter()
            .map(|mut record| {
                let id = t.allocate_id();
                record.insert(ID_FIELD.to_string(), Value::from(id));
                t.rows.insert(id, record.clone());
                RecordResult::ok(Some(record))
            })
            .collect();

        debug!(table, "Created records");
        Ok(BatchResponse::from_results(results))
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        self.ensure_available()?;

        let mut tables = self.tables.write();
        let t = tables.entry(table.to_string()).or_default();

        let checks: Vec<Result<(), RecordResult>> = records
            .iter()
            .map(|r| match record_id(r) {
                None => Err(RecordResult::failed("Record Id is required for update")),
                Some(id) if !t.rows.contains_key(&id) => {
                    Err(RecordResult::failed(format!("Record {} not found", id)))
                }
                Some(_) => {
                    let errors = self.validate(table, r, true);
                    if errors.is_empty() {
                        Ok(())
                    } else {
                        Err(RecordResult::invalid(errors))
                    }
                }
            })
            .collect();
        if let Some(rejection) = batch_rejection(&checks) {
            return Ok(rejection);
        }

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let Some(id) = record_id(&record) else {
                results.push(RecordResult::failed("Record Id is required for update"));
                continue;
            };
            match t.rows.get_mut(&id) {
                Some(existing) => {
                    for (field, value) in record {
                        if field != ID_FIELD {
                            existing.insert(field, value);
                        }
                    }
                    results.push(RecordResult::ok(Some(existing.clone())));
                }
                None => results.push(RecordResult::failed(format!("Record {} not found", id))),
            }
        }

        debug!(table, "Updated records");
        Ok(BatchResponse::from_results(results))
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> AppResult<BatchResponse> {
        self.ensure_available()?;

        let mut tables = self.tables.write();
        let t = tables.entry(table.to_string()).or_default();

        let checks: Vec<Result<(), RecordResult>> = ids
            .iter()
            .map(|id| {
                if t.rows.contains_key(id) {
                    Ok(())
                } else {
                    Err(RecordResult::failed(format!("Record {} not found", id)))
                }
            })
            .collect();
        if let Some(rejection) = batch_rejection(&checks) {
            return Ok(rejection);
        }

        let results = ids
            .iter()
            .map(|id| {
                t.rows.remove(id);
                RecordResult::ok(None)
            })
            .collect();

        debug!(table, count = ids.len(), "Deleted records");
        Ok(BatchResponse::from_results(results))
    }
}

#[async_trait]
impl HealthCheck for InMemoryRecordStore {
    type Details = MemoryStoreDetails;

    async fn check(&self) -> HealthCheckResult<MemoryStoreDetails> {
        let tables = self.tables.read();
        let details = MemoryStoreDetails {
            tables: tables.len(),
            records: tables.values().map(|t| t.rows.len()).sum(),
        };
        drop(tables);

        if self.is_available() {
            HealthCheckResult::healthy(0, details)
        } else {
            HealthCheckResult::unhealthy("Record store is unavailable", Some(details))
        }
    }

    fn component_name(&self) -> &'static str {
        "record-store-memory"
    }
}
