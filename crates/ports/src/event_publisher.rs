//! 领域事件出口

use async_trait::async_trait;
use hse_errors::AppResult;
use serde::Serialize;

/// 事件发布端口
///
/// 主题形如 `compliance.workflow.<event>`。发布失败由调用方决定是否忽略，
/// 工作流状态变更不会因此回滚
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 序列化为 JSON 后发布
    async fn publish<E: Serialize + Send + Sync>(&self, topic: &str, event: &E) -> AppResult<()>;

    /// 发布已序列化的负载
    async fn publish_raw(&self, topic: &str, payload: &str) -> AppResult<()>;

    /// 同一主题下按顺序发布，遇到第一个失败即返回
    async fn publish_batch<E: Serialize + Send + Sync>(
        &self,
        topic: &str,
        events: &[E],
    ) -> AppResult<()>;
}
