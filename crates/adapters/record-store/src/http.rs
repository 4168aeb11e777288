//! 远程记录 API 客户端
//!
//! 接口映射：
//! - `POST   {base}/tables/{table}/records/query`  条件查询
//! - `GET    {base}/tables/{table}/records/{id}`   按主键读取
//! - `POST   {base}/tables/{table}/records`        批量创建
//! - `PATCH  {base}/tables/{table}/records`        批量更新
//! - `DELETE {base}/tables/{table}/records`        批量删除 (`{"RecordIds": [..]}`)
//!
//! 不做自动重试：每个操作只发出一次请求。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hse_common::{HealthCheck, HealthCheckResult};
use hse_errors::{AppError, AppResult};
use hse_ports::{
    BatchResponse, FetchQuery, FetchResponse, Record, RecordId, RecordResponse, RecordStore,
};
use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// 错误响应体截断长度
const MAX_ERROR_BODY: usize = 200;

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct HttpRecordStoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl HttpRecordStoreConfig {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            api_key: Secret::new(String::new()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct RecordsBody<'a> {
    records: &'a [Record],
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    #[serde(rename = "RecordIds")]
    record_ids: &'a [RecordId],
}

/// 远程记录存储
pub struct HttpRecordStore {
    http: Client,
    base_url: String,
    project_id: String,
    api_key: Secret<String>,
}

impl HttpRecordStore {
    pub fn new(config: HttpRecordStoreConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            api_key: config.api_key,
        })
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/json")
            .header("X-Project-Id", &self.project_id);
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            request
        } else {
            request.bearer_auth(key)
        }
    }

    /// 发送请求并记录指标
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        table: &str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let start = Instant::now();
        let result = self.execute(operation, table, request).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        counter!("record_store_requests_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        histogram!("record_store_request_duration_ms", "operation" => operation)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        table: &str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = self.authorize(request).send().await.map_err(|e| {
            warn!(operation, table, error = %e, "Record store request failed");
            AppError::external_service(format!("Record store unreachable: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service(format!("Failed to read record store response: {}", e))
        })?;

        if status.is_success() {
            debug!(operation, table, status = status.as_u16(), "Record store request completed");
            return serde_json::from_str(&body).map_err(|e| {
                AppError::external_service(format!("Invalid record store response: {}", e))
            });
        }

        // 校验类失败同样返回结构化结果 (success=false + errors)
        if is_structured_refusal(status) {
            if let Ok(parsed) = serde_json::from_str::<T>(&body) {
                warn!(operation, table, status = status.as_u16(), "Record store refused request");
                return Ok(parsed);
            }
        }

        warn!(operation, table, status = status.as_u16(), "Record store returned error status");
        Err(status_error(status, &body))
    }
}

/// 非成功状态码映射为应用错误
fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::unauthenticated(format!("Record store rejected the API key ({})", status))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::resource_exhausted("Record store rate limit exceeded")
        }
        _ => AppError::external_service(format!(
            "Record store error {}: {}",
            status,
            body.chars().take(MAX_ERROR_BODY).collect::<String>()
        )),
    }
}

fn is_structured_refusal(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
    )
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_records(&self, table: &str, query: &FetchQuery) -> AppResult<FetchResponse> {
        let request = self
            .http
            .post(format!("{}/query", self.records_url(table)))
            .json(query);
        self.send("fetch", table, request).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> AppResult<RecordResponse> {
        let mut request = self.http.get(format!("{}/{}", self.records_url(table), id));
        if !fields.is_empty() {
            request = request.query(&[("fields", fields.join(","))]);
        }
        self.send("get", table, request).await
    }

    async fn create_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        let request = self
            .http
            .post(self.records_url(table))
            .json(&RecordsBody { records: &records });
        self.send("create", table, request).await
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        let request = self
            .http
            .patch(self.records_url(table))
            .json(&RecordsBody { records: &records });
        self.send("update", table, request).await
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> AppResult<BatchResponse> {
        let request = self
            .http
            .delete(self.records_url(table))
            .json(&DeleteBody { record_ids: ids });
        self.send("delete", table, request).await
    }
}

#[async_trait]
impl HealthCheck for HttpRecordStore {
    type Details = u16;

    async fn check(&self) -> HealthCheckResult<u16> {
        let start = Instant::now();
        let request = self.authorize(self.http.get(format!("{}/health", self.base_url)));
        match request.send().await {
            Ok(response) if response.status().is_success() => HealthCheckResult::healthy(
                start.elapsed().as_millis() as u64,
                response.status().as_u16(),
            ),
            Ok(response) => HealthCheckResult::unhealthy(
                format!("Record store health endpoint returned {}", response.status()),
                Some(response.status().as_u16()),
            ),
            Err(e) => {
                HealthCheckResult::unhealthy(format!("Record store unreachable: {}", e), None)
            }
        }
    }

    fn component_name(&self) -> &'static str {
        "record-store-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = HttpRecordStoreConfig::new("https://records.example.ma/api/", "hse");
        let store = HttpRecordStore::new(config).unwrap();
        assert_eq!(
            store.records_url("workflow_c"),
            "https://records.example.ma/api/tables/workflow_c/records"
        );
    }

    #[test]
    fn test_delete_body_shape() {
        let body = serde_json::to_value(DeleteBody { record_ids: &[3, 4] }).unwrap();
        assert_eq!(body, serde_json::json!({"RecordIds": [3, 4]}));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            AppError::Unauthenticated(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            AppError::ResourceExhausted(_)
        ));
        let long_body = "x".repeat(MAX_ERROR_BODY * 2);
        match status_error(StatusCode::BAD_GATEWAY, &long_body) {
            AppError::ExternalService(msg) => assert!(msg.len() < long_body.len()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_is_external_error() {
        let store = HttpRecordStore::new(
            HttpRecordStoreConfig::new("http://127.0.0.1:9", "hse")
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = store
            .fetch_records("workflow_c", &FetchQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
        assert!(!store.quick_check().await);
    }
}
