//! 领域事件与投递信封

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 领域事件
pub trait DomainEvent: Send + Sync + Serialize {
    /// 事件名，如 `approved`
    fn event_type(&self) -> &'static str;

    fn aggregate_type(&self) -> &'static str;

    fn aggregate_id(&self) -> String;

    /// 发布主题: `{context}.{aggregate}.{event}`
    fn topic(&self, context: &str) -> String {
        format!("{}.{}.{}", context, self.aggregate_type(), self.event_type())
    }
}

/// 投递信封，事件数据放在 `data` 下
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    /// UUID v7，按时间有序
    pub id: Uuid,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: String,
    /// 事件发生后的聚合版本
    pub version: u64,
    pub data: E,
    pub metadata: EventMetadata,
    pub occurred_at: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(event: E, version: u64, metadata: EventMetadata) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event.event_type().to_string(),
            aggregate_type: event.aggregate_type().to_string(),
            aggregate_id: event.aggregate_id(),
            version,
            data: event,
            metadata,
            occurred_at: Utc::now(),
        }
    }
}

/// 触发者信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    pub user_id: Option<String>,
    pub site_id: Option<String>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }
}
