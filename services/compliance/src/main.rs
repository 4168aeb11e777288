//! HSE Compliance - 启动入口
//!
//! 加载配置、初始化日志与指标、连接记录存储并完成启动检查后退出

use std::sync::Arc;
use std::time::Duration;

use hse_adapter_record_store::{HttpRecordStore, HttpRecordStoreConfig, InMemoryRecordStore};
use hse_config::{AppConfig, RecordStoreBackend};
use hse_compliance::infrastructure::TracingEventPublisher;
use hse_compliance::{ComplianceApp, StartupReport, prepare};
use hse_domain_core::Language;
use hse_telemetry::{init_metrics, init_tracing_for};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_tracing_for(
        &config.telemetry.log_level,
        config.telemetry.json || config.is_production(),
    );
    if let Err(e) = init_metrics() {
        warn!(error = %e, "Metrics recorder not installed");
    }

    let language: Language = config.locale.default_language.parse().unwrap_or_else(|e| {
        warn!(error = %e, "Unknown default language, falling back");
        Language::default()
    });
    info!(
        app = %config.app_name,
        env = %config.app_env,
        backend = ?config.record_store.backend,
        language = %language,
        "Starting compliance core"
    );

    let publisher = Arc::new(TracingEventPublisher::new());
    let approvals = config.workflow.default_required_approvals;

    let report = match config.record_store.backend {
        RecordStoreBackend::Memory => {
            let store = Arc::new(InMemoryRecordStore::new());
            prepare(&ComplianceApp::new(store, publisher, approvals), &config).await?
        }
        RecordStoreBackend::Http => {
            let store_config = HttpRecordStoreConfig::new(
                config.record_store.base_url.clone(),
                config.record_store.project_id.clone(),
            )
            .with_api_key(config.record_store.api_key.clone())
            .with_timeout(Duration::from_secs(config.record_store.timeout_secs));
            let store = Arc::new(HttpRecordStore::new(store_config)?);
            prepare(&ComplianceApp::new(store, publisher, approvals), &config).await?
        }
    };

    log_report(&report);
    Ok(())
}

fn log_report(report: &StartupReport) {
    if let Some(seed) = report.seed {
        info!(
            roles_created = seed.roles_created,
            permissions_created = seed.permissions_created,
            "Seed complete"
        );
    }
    if !report.health.healthy {
        warn!(failing = ?report.health.failing(), "Startup checks reported problems");
    }
    info!(permission_entries = report.permission_entries, "Startup checks finished");
}
