//! 进程内事件收集

use async_trait::async_trait;
use hse_errors::AppResult;
use hse_ports::EventPublisher;
use parking_lot::Mutex;
use serde::Serialize;

/// 记录所有发布的 `(topic, payload)`
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: Mutex<Vec<(String, String)>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// 指定主题的负载，按发布顺序解析为 JSON
    pub fn payloads(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .filter_map(|(_, payload)| serde_json::from_str(payload).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish<E: Serialize + Send + Sync>(&self, topic: &str, event: &E) -> AppResult<()> {
        let payload = serde_json::to_string(event)?;
        self.publish_raw(topic, &payload).await
    }

    async fn publish_raw(&self, topic: &str, payload: &str) -> AppResult<()> {
        self.published
            .lock()
            .push((topic.to_string(), payload.to_string()));
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
