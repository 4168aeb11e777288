//! 分页集成测试：存储端不返回总数、默认条数上限、越界页码

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{create_command, insert_user};
use hse_adapter_record_store::InMemoryRecordStore;
use hse_common::Pagination;
use hse_compliance::ComplianceApp;
use hse_compliance::domain::access::{ActingUser, PermissionTable, RoleCode};
use hse_compliance::domain::workflow::WorkflowFilter;
use hse_compliance::infrastructure::InMemoryEventPublisher;
use hse_domain_core::Language;
use hse_errors::AppResult;
use hse_ports::{
    BatchResponse, FetchQuery, FetchResponse, PagingInfo, Record, RecordId, RecordResponse,
    RecordStore,
};

/// 未指定分页时最多返回的条数
const DEFAULT_LIMIT: u32 = 50;

/// 只返回 `{success, data, message}` 的记录存储，未分页的查询被截断
struct BareStore {
    inner: Arc<InMemoryRecordStore>,
}

#[async_trait]
impl RecordStore for BareStore {
    async fn fetch_records(&self, table: &str, query: &FetchQuery) -> AppResult<FetchResponse> {
        let mut query = query.clone();
        query.paging_info.get_or_insert(PagingInfo {
            limit: DEFAULT_LIMIT,
            offset: 0,
        });
        let mut response = self.inner.fetch_records(table, &query).await?;
        response.total = None;
        Ok(response)
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> AppResult<RecordResponse> {
        self.inner.get_record_by_id(table, id, fields).await
    }

    async fn create_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        self.inner.create_records(table, records).await
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> AppResult<BatchResponse> {
        self.inner.update_records(table, records).await
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> AppResult<BatchResponse> {
        self.inner.delete_records(table, ids).await
    }
}

type BareApp = ComplianceApp<BareStore, InMemoryEventPublisher>;

async fn bare_app() -> (Arc<InMemoryRecordStore>, BareApp, ActingUser) {
    let inner = Arc::new(InMemoryRecordStore::new());
    let store = Arc::new(BareStore {
        inner: inner.clone(),
    });
    let app = ComplianceApp::new(store, Arc::new(InMemoryEventPublisher::new()), 1);
    app.role_admin.seed_defaults().await.unwrap();
    let ceo = insert_user(&inner, "Karim Alaoui", RoleCode::Ceo, None).await;
    (inner, app, ceo)
}

async fn create_many(app: &BareApp, ceo: ActingUser, count: usize) {
    for n in 0..count {
        app.workflow_commands
            .handle_create(create_command(ceo, &format!("Audit {n}"), None, None))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_seed_reads_whole_permission_table() {
    let (inner, app, _) = bare_app().await;
    let expected = PermissionTable::default_matrix().len();
    assert!(expected > DEFAULT_LIMIT as usize);
    assert_eq!(inner.count("permission_c"), expected);

    let again = app.role_admin.seed_defaults().await.unwrap();
    assert!(again.is_noop());
    assert_eq!(inner.count("permission_c"), expected);
    assert_eq!(inner.count("role_c"), 3);

    let table = app.access.permission_table().await.unwrap();
    assert_eq!(table.len(), expected);
}

#[tokio::test]
async fn test_listing_without_store_total() {
    let (_, app, ceo) = bare_app().await;
    create_many(&app, ceo, 105).await;

    let stats = app.workflow_queries.stats(&ceo).await.unwrap();
    assert_eq!(stats.total, 105);

    let first = app
        .workflow_queries
        .list_visible(
            &ceo,
            WorkflowFilter::default(),
            Pagination::new(1, 20),
            Language::En,
        )
        .await
        .unwrap();
    assert_eq!(first.items.len(), 20);
    assert!(first.has_more());

    let last = app
        .workflow_queries
        .list_visible(
            &ceo,
            WorkflowFilter::default(),
            Pagination::new(6, 20),
            Language::En,
        )
        .await
        .unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.total, 105);
    assert!(!last.has_more());
}

#[tokio::test]
async fn test_page_number_beyond_range_is_empty() {
    let (_, app, ceo) = bare_app().await;
    create_many(&app, ceo, 3).await;

    let page = app
        .workflow_queries
        .list_visible(
            &ceo,
            WorkflowFilter::default(),
            Pagination::new(u32::MAX, 20),
            Language::En,
        )
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more());
}
