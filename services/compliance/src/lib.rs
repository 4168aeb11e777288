//! hse-compliance - HSE 合规核心
//!
//! 访问控制 (角色 × 资源 × 操作 → 可见范围) 与工作流生命周期

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod startup;

pub use startup::{ComplianceApp, StartupReport, prepare};
