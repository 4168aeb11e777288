//! hse-errors - 统一错误类型

use thiserror::Error;

/// 应用错误
///
/// 记录不可见与记录不存在统一报告为 `NotFound`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 记录存储拒绝了凭据
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 角色或范围不允许该操作
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 并发修改或重复审批
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 当前状态不允许该操作
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 由记录存储返回的字段级错误构造校验错误
    ///
    /// 每个 `(字段, 消息)` 对保留为一条独立的提示
    pub fn field_errors<I, L, M>(errors: I) -> Self
    where
        I: IntoIterator<Item = (L, M)>,
        L: AsRef<str>,
        M: AsRef<str>,
    {
        let joined = errors
            .into_iter()
            .map(|(label, message)| format!("{}: {}", label.as_ref(), message.as_ref()))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(joined)
    }

    /// 调用方可以修正输入后重试 (与基础设施故障相对)
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::ExternalService(_) | Self::ResourceExhausted(_) | Self::Internal(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("Serialization failed: {}", err))
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
