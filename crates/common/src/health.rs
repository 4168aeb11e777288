//! 外部依赖 (记录存储等) 的可用性探测

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error};

const TIMEOUT_MESSAGE: &str = "Health check timed out";

/// 一次探测的结果，`D` 为组件自定义的附加信息
#[derive(Debug, Clone)]
pub struct HealthCheckResult<D> {
    healthy: bool,
    latency_ms: Option<u64>,
    error: Option<String>,
    pub details: Option<D>,
}

impl<D> HealthCheckResult<D> {
    pub fn healthy(latency_ms: u64, details: D) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    pub fn unhealthy(error: impl Into<String>, details: Option<D>) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            error: Some(error.into()),
            details,
        }
    }

    pub fn timeout() -> Self {
        Self::unhealthy(TIMEOUT_MESSAGE, None)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// 可探测的组件
#[async_trait]
pub trait HealthCheck: Send + Sync {
    type Details: Send + Sync;

    async fn check(&self) -> HealthCheckResult<Self::Details>;

    /// 日志和健康报告中使用的组件名
    fn component_name(&self) -> &'static str;

    async fn quick_check(&self) -> bool {
        self.check().await.is_healthy()
    }
}

/// 在超时内探测一次，不重试
///
/// 组件未报告延迟时以实际耗时补上
pub async fn check_once<H: HealthCheck + ?Sized>(
    checker: &H,
    timeout: Duration,
) -> HealthCheckResult<H::Details> {
    let started = Instant::now();
    let Ok(mut result) = tokio::time::timeout(timeout, checker.check()).await else {
        error!(
            component = checker.component_name(),
            timeout_ms = timeout.as_millis() as u64,
            "Health check timed out"
        );
        return HealthCheckResult::timeout();
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if result.is_healthy() {
        result.latency_ms.get_or_insert(elapsed_ms);
        debug!(component = checker.component_name(), elapsed_ms, "Health check passed");
    } else {
        error!(
            component = checker.component_name(),
            error = result.error().unwrap_or("unknown error"),
            "Health check failed"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    #[async_trait]
    impl HealthCheck for Refusing {
        type Details = ();

        async fn check(&self) -> HealthCheckResult<()> {
            HealthCheckResult::unhealthy("Connection refused", None)
        }

        fn component_name(&self) -> &'static str {
            "refusing"
        }
    }

    struct Sluggish;

    #[async_trait]
    impl HealthCheck for Sluggish {
        type Details = u32;

        async fn check(&self) -> HealthCheckResult<u32> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            HealthCheckResult::healthy(200, 3)
        }

        fn component_name(&self) -> &'static str {
            "sluggish"
        }
    }

    #[test]
    fn test_result_constructors() {
        let up = HealthCheckResult::healthy(12, "tables: 4");
        assert!(up.is_healthy());
        assert_eq!(up.latency_ms(), Some(12));
        assert_eq!(up.details, Some("tables: 4"));

        let down: HealthCheckResult<()> = HealthCheckResult::unhealthy("Connection failed", None);
        assert!(!down.is_healthy());
        assert_eq!(down.error(), Some("Connection failed"));
    }

    #[tokio::test]
    async fn test_check_once_reports_failure() {
        let result = check_once(&Refusing, Duration::from_secs(1)).await;
        assert!(!result.is_healthy());
        assert_eq!(result.error(), Some("Connection refused"));
        assert!(!Refusing.quick_check().await);
    }

    #[tokio::test]
    async fn test_check_once_times_out() {
        let result = check_once(&Sluggish, Duration::from_millis(10)).await;
        assert!(!result.is_healthy());
        assert_eq!(result.error(), Some(TIMEOUT_MESSAGE));
        assert!(result.details.is_none());
    }
}
