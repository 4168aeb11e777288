//! hse-telemetry - 日志、指标与启动检查汇总

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化文本格式的 tracing，`RUST_LOG` 优先于配置的级别
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 按配置选择日志格式
pub fn init_tracing_for(log_level: &str, json: bool) {
    if json {
        init_tracing_json(log_level);
    } else {
        init_tracing(log_level);
    }
}

/// 初始化 Prometheus metrics
///
/// 进程内只能安装一次，重复安装返回错误
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// 启动检查汇总，任一检查项失败即整体不健康
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub checks: Vec<CheckEntry>,
}

/// 单个检查项
#[derive(Debug, Clone)]
pub struct CheckEntry {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            healthy: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, name: impl Into<String>, healthy: bool, message: Option<String>) {
        self.healthy &= healthy;
        self.checks.push(CheckEntry {
            name: name.into(),
            healthy,
            message,
        });
    }

    /// 失败检查项的名称
    pub fn failing(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.healthy)
            .map(|c| c.name.as_str())
            .collect()
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_aggregation() {
        let mut status = HealthStatus::new();
        status.add_check("record_store", true, None);
        assert!(status.healthy);

        status.add_check("permission_table", false, Some("empty".to_string()));
        assert!(!status.healthy);
        assert_eq!(status.failing(), vec!["permission_table"]);
    }
}
