//! 访问控制应用服务

pub mod service;

pub use service::AccessControlService;
