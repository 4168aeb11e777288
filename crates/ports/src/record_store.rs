//! 记录存储 (Record Store) 端口
//!
//! 远程记录 API 的通用 CRUD 契约：按表名和字段列表读写 JSON 记录。
//!
//! 错误分层：
//! - `Err(AppError)`: 传输或可用性故障
//! - `success == false` + `message`: 存储端拒绝
//! - 单条结果中的 `errors`: 字段级校验失败

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hse_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 单条记录 (字段名 → 值)
pub type Record = Map<String, Value>;

/// 记录主键
pub type RecordId = i64;

/// 主键字段名
pub const ID_FIELD: &str = "Id";

/// 记录存储 trait
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 条件查询
    async fn fetch_records(&self, table: &str, query: &FetchQuery) -> AppResult<FetchResponse>;

    /// 按主键读取
    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> AppResult<RecordResponse>;

    /// 批量创建
    async fn create_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse>;

    /// 批量更新，每条记录必须携带 `Id`
    async fn update_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse>;

    /// 批量删除
    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> AppResult<BatchResponse>;
}

/// 条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    GreaterThan,
    LessThan,
    HasValue,
}

/// 单个查询条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field_name: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            values,
        }
    }

    pub fn equal_to(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::EqualTo, vec![value.into()])
    }

    pub fn not_equal_to(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::NotEqualTo, vec![value.into()])
    }

    pub fn contains(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::Contains, vec![value.into()])
    }

    pub fn has_value(field_name: impl Into<String>) -> Self {
        Self::new(field_name, Operator::HasValue, Vec::new())
    }
}

/// 条件组连接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

/// 条件组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: GroupOperator,
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            operator: GroupOperator::Or,
            conditions,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            operator: GroupOperator::And,
            conditions,
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// 查询参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    /// 返回字段，空表示全部
    #[serde(default)]
    pub fields: Vec<String>,
    /// 顶层条件 (AND)
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// 条件组 (组间 AND)
    #[serde(rename = "whereGroups", default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ConditionGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn group(mut self, group: ConditionGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn order_by(mut self, field_name: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field_name: field_name.into(),
            direction,
        });
        self
    }

    pub fn paging(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

/// 查询响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Record>,
    /// 满足条件的总数 (分页前)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FetchResponse {
    pub fn ok(data: Vec<Record>, total: u64) -> Self {
        Self {
            success: true,
            data,
            total: Some(total),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// 取出记录，存储端拒绝时转换为错误
    pub fn into_records(self) -> AppResult<Vec<Record>> {
        if !self.success {
            return Err(refused(self.message));
        }
        Ok(self.data)
    }
}

/// 单条读取响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResponse {
    /// 取出记录；记录不存在时为 `None`
    pub fn into_data(self) -> AppResult<Option<Record>> {
        if !self.success {
            return Err(refused(self.message));
        }
        Ok(self.data)
    }
}

/// 字段级错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_label: String,
    pub message: String,
}

/// 批量操作中单条记录的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResult {
    pub fn ok(data: Option<Record>) -> Self {
        Self {
            success: true,
            data,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn invalid(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            errors,
            ..Default::default()
        }
    }
}

/// 批量操作响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<RecordResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BatchResponse {
    pub fn from_results(results: Vec<RecordResult>) -> Self {
        Self {
            success: results.iter().all(|r| r.success),
            results,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// 所有记录均成功时返回各自数据
    ///
    /// 任一记录失败则整体视为失败，字段错误合并为一个校验错误
    pub fn into_all(self) -> AppResult<Vec<Option<Record>>> {
        let failures: Vec<&RecordResult> = self.results.iter().filter(|r| !r.success).collect();
        if !failures.is_empty() {
            let field_errors: Vec<&FieldError> =
                failures.iter().flat_map(|r| r.errors.iter()).collect();
            if !field_errors.is_empty() {
                return Err(AppError::field_errors(
                    field_errors
                        .iter()
                        .map(|e| (e.field_label.as_str(), e.message.as_str())),
                ));
            }
            let message = failures
                .iter()
                .filter_map(|r| r.message.as_deref())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::validation(if message.is_empty() {
                "Record rejected by store".to_string()
            } else {
                message
            }));
        }
        if !self.success {
            return Err(refused(self.message));
        }
        Ok(self.results.into_iter().map(|r| r.data).collect())
    }

    /// 单条操作的结果数据
    pub fn into_single(self) -> AppResult<Record> {
        self.into_all()?
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| AppError::external_service("Record store returned no record data"))
    }

    /// 只关心是否成功 (删除等)
    pub fn ensure_success(self) -> AppResult<()> {
        self.into_all().map(|_| ())
    }
}

fn refused(message: Option<String>) -> AppError {
    AppError::external_service(
        message.unwrap_or_else(|| "Record store rejected the request".to_string()),
    )
}

// ---------------------------------------------------------------------------
// 记录值读取
// ---------------------------------------------------------------------------

/// 读取关联字段的主键
///
/// 关联字段可能是裸整数 `7`、数字字符串 `"7"` 或展开对象 `{"Id": 7, "Name": ..}`
pub fn lookup_id(record: &Record, field: &str) -> Option<i64> {
    value_as_id(record.get(field)?)
}

fn value_as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get(ID_FIELD).and_then(value_as_id),
        _ => None,
    }
}

/// 记录主键
pub fn record_id(record: &Record) -> Option<RecordId> {
    lookup_id(record, ID_FIELD)
}

/// 读取字符串字段，`null` 或缺失时为 `None`
pub fn get_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// 读取字符串字段，缺失时为空串
pub fn get_string(record: &Record, field: &str) -> String {
    get_str(record, field).unwrap_or_default().to_string()
}

/// 读取整数字段，兼容数字字符串
pub fn get_i64(record: &Record, field: &str) -> Option<i64> {
    match record.get(field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn get_bool(record: &Record, field: &str) -> Option<bool> {
    match record.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 读取 RFC 3339 时间字段
pub fn get_datetime(record: &Record, field: &str) -> AppResult<Option<DateTime<Utc>>> {
    match get_str(record, field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| AppError::internal(format!("Invalid timestamp in {}: {}", field, e))),
    }
}

/// 时间写入格式
pub fn datetime_value(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |dt| Value::String(dt.to_rfc3339()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_query_wire_shape() {
        let query = FetchQuery::new()
            .fields(["Id", "status_c"])
            .filter(Condition::equal_to("site_id_c", 3))
            .group(ConditionGroup::any(vec![
                Condition::equal_to("assigned_to_c", 7),
                Condition::equal_to("created_by_c", 7),
            ]))
            .order_by("due_date_c", SortDirection::Asc)
            .paging(20, 40);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["where"][0]["FieldName"], "site_id_c");
        assert_eq!(json["where"][0]["Operator"], "EqualTo");
        assert_eq!(json["whereGroups"][0]["operator"], "OR");
        assert_eq!(json["orderBy"][0]["fieldName"], "due_date_c");
        assert_eq!(json["pagingInfo"]["offset"], 40);
    }

    #[test]
    fn test_lookup_id_shapes() {
        let rec = record(json!({
            "a": 7,
            "b": {"Id": 8, "Name": "Karim"},
            "c": "9",
            "d": null
        }));
        assert_eq!(lookup_id(&rec, "a"), Some(7));
        assert_eq!(lookup_id(&rec, "b"), Some(8));
        assert_eq!(lookup_id(&rec, "c"), Some(9));
        assert_eq!(lookup_id(&rec, "d"), None);
        assert_eq!(lookup_id(&rec, "missing"), None);
    }

    #[test]
    fn test_batch_field_errors_become_validation() {
        let response = BatchResponse::from_results(vec![RecordResult::invalid(vec![
            FieldError {
                field_label: "Title".into(),
                message: "is required".into(),
            },
            FieldError {
                field_label: "Site".into(),
                message: "must reference a site".into(),
            },
        ])]);

        match response.into_single() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("Title: is required"));
                assert!(msg.contains("Site: must reference a site"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_refused_fetch_is_external_error() {
        let err = FetchResponse::failed("token expired").into_records().unwrap_err();
        assert!(matches!(err, AppError::ExternalService(msg) if msg == "token expired"));
    }

    #[test]
    fn test_datetime_helpers() {
        let rec = record(json!({"at": "2026-03-01T08:30:00Z", "blank": ""}));
        let at = get_datetime(&rec, "at").unwrap().unwrap();
        assert_eq!(datetime_value(Some(at)), json!("2026-03-01T08:30:00+00:00"));
        assert_eq!(get_datetime(&rec, "blank").unwrap(), None);
        assert!(get_datetime(&record(json!({"x": "nope"})), "x").is_err());
    }
}
