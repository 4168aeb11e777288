//! 以结构化日志输出事件

use async_trait::async_trait;
use hse_errors::AppResult;
use hse_ports::EventPublisher;
use metrics::counter;
use serde::Serialize;
use tracing::info;

/// 将事件写入日志，不投递到外部
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish<E: Serialize + Send + Sync>(&self, topic: &str, event: &E) -> AppResult<()> {
        let payload = serde_json::to_string(event)?;
        self.publish_raw(topic, &payload).await
    }

    async fn publish_raw(&self, topic: &str, payload: &str) -> AppResult<()> {
        info!(topic, payload, "Domain event");
        counter!("events_published_total", "topic" => topic.to_string()).increment(1);
        Ok(())
    }

    async fn publish_batch<E: Serialize + Send + Sync>(
        &self,
        topic: &str,
        events: &[E],
    ) -> AppResult<()> {
        for event in events {
            self.publish(topic, event).await?;
        }
        Ok(())
    }
}
