//! hse-config - 配置加载库
//!
//! 加载顺序: `default.toml` → `{APP_ENV}.toml` → `HSE_` 前缀环境变量

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 记录存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStoreBackend {
    /// 进程内存储 (本地开发、测试)
    #[default]
    Memory,
    /// 远程记录 API
    Http,
}

/// 记录存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct RecordStoreConfig {
    #[serde(default)]
    pub backend: RecordStoreBackend,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_api_key")]
    pub api_key: Secret<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key() -> Secret<String> {
    Secret::new(String::new())
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            backend: RecordStoreBackend::default(),
            base_url: String::new(),
            project_id: String::new(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 本地化配置
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// 默认界面语言 (en / ar / fr)
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_language() -> String {
    "fr".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

/// 工作流配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// 新建工作流默认所需审批数
    #[serde(default = "default_required_approvals")]
    pub default_required_approvals: u32,
    /// 启动时写入系统角色和默认权限矩阵
    #[serde(default = "default_seed_defaults")]
    pub seed_defaults: bool,
}

fn default_required_approvals() -> u32 {
    1
}

fn default_seed_defaults() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_required_approvals: default_required_approvals(),
            seed_defaults: default_seed_defaults(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    #[serde(default)]
    pub record_store: RecordStoreConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Serialize)]
struct BaseDefaults {
    app_name: &'static str,
    app_env: String,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: Self = Figment::new()
            .merge(Serialized::defaults(BaseDefaults {
                app_name: "hse-compliance",
                app_env: env.clone(),
            }))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("HSE_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// 校验跨字段约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.record_store.backend == RecordStoreBackend::Http
            && self.record_store.base_url.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "record_store.base_url is required for the http backend".to_string(),
            ));
        }
        if self.workflow.default_required_approvals == 0 {
            return Err(ConfigError::Invalid(
                "workflow.default_required_approvals must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
