//! 服务装配与启动检查
//!
//! 启动顺序：健康检查 (一次，不重试) → 写入默认角色与权限 → 解析权限矩阵

use std::sync::Arc;
use std::time::Duration;

use hse_common::{HealthCheck, check_once};
use hse_config::AppConfig;
use hse_errors::{AppError, AppResult};
use hse_ports::{EventPublisher, RecordStore};
use hse_telemetry::HealthStatus;
use tracing::{error, info};

use crate::application::{
    AccessControlService, RoleAdminHandler, SeedReport, WorkflowCommandHandler,
    WorkflowQueryHandler,
};
use crate::infrastructure::{
    RecordStorePermissionRepository, RecordStoreRoleRepository, RecordStoreSiteRepository,
    RecordStoreUserRepository, RecordStoreWorkflowRepository,
};

type Permissions<S> = RecordStorePermissionRepository<S>;

/// 装配完成的服务组件
pub struct ComplianceApp<S, EP>
where
    S: RecordStore,
    EP: EventPublisher,
{
    pub store: Arc<S>,
    pub access: Arc<AccessControlService<Permissions<S>>>,
    pub workflow_commands:
        WorkflowCommandHandler<RecordStoreWorkflowRepository<S>, Permissions<S>, EP>,
    pub workflow_queries: WorkflowQueryHandler<
        RecordStoreWorkflowRepository<S>,
        Permissions<S>,
        RecordStoreUserRepository<S>,
        RecordStoreSiteRepository<S>,
    >,
    pub role_admin: RoleAdminHandler<RecordStoreRoleRepository<S>, Permissions<S>>,
}

impl<S, EP> ComplianceApp<S, EP>
where
    S: RecordStore,
    EP: EventPublisher,
{
    pub fn new(store: Arc<S>, event_publisher: Arc<EP>, default_required_approvals: u32) -> Self {
        let permission_repo = Arc::new(RecordStorePermissionRepository::new(store.clone()));
        let role_repo = Arc::new(RecordStoreRoleRepository::new(store.clone()));
        let workflow_repo = Arc::new(RecordStoreWorkflowRepository::new(store.clone()));
        let user_repo = Arc::new(RecordStoreUserRepository::new(store.clone()));
        let site_repo = Arc::new(RecordStoreSiteRepository::new(store.clone()));

        let access = Arc::new(AccessControlService::new(permission_repo.clone()));

        let workflow_commands =
            WorkflowCommandHandler::new(workflow_repo.clone(), access.clone(), event_publisher)
                .with_default_required_approvals(default_required_approvals);
        let workflow_queries =
            WorkflowQueryHandler::new(workflow_repo, access.clone(), user_repo, site_repo);
        let role_admin = RoleAdminHandler::new(role_repo, permission_repo, access.clone());

        Self {
            store,
            access,
            workflow_commands,
            workflow_queries,
            role_admin,
        }
    }
}

/// 启动检查结果
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub health: HealthStatus,
    /// 未启用初始化时为 `None`
    pub seed: Option<SeedReport>,
    pub permission_entries: usize,
}

/// 执行启动检查
///
/// 记录存储不可用时只记录一次错误并返回，不重试
pub async fn prepare<S, EP>(
    app: &ComplianceApp<S, EP>,
    config: &AppConfig,
) -> AppResult<StartupReport>
where
    S: RecordStore + HealthCheck,
    EP: EventPublisher,
{
    let mut health = HealthStatus::new();

    let timeout = Duration::from_secs(config.record_store.timeout_secs.max(1));
    let store_health = check_once(app.store.as_ref(), timeout).await;
    health.add_check(
        app.store.component_name(),
        store_health.is_healthy(),
        store_health.error().map(str::to_string),
    );
    if !store_health.is_healthy() {
        let reason = store_health.error().unwrap_or("unknown error").to_string();
        error!(error = %reason, "Record store unavailable, aborting startup");
        return Err(AppError::external_service(format!(
            "Record store unavailable: {}",
            reason
        )));
    }

    let seed = if config.workflow.seed_defaults {
        Some(app.role_admin.seed_defaults().await?)
    } else {
        None
    };

    let table = app.access.permission_table().await?;
    health.add_check(
        "permission_table",
        !table.is_empty(),
        table.is_empty().then(|| "no permission entries".to_string()),
    );

    info!(
        app = %config.app_name,
        env = %config.app_env,
        permission_entries = table.len(),
        seeded = seed.is_some(),
        "Compliance core ready"
    );

    Ok(StartupReport {
        health,
        seed,
        permission_entries: table.len(),
    })
}
