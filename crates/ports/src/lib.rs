//! ports - 抽象 trait 层
//!
//! 定义记录存储与事件发布的抽象接口

mod event_publisher;
mod record_store;

pub use event_publisher::*;
pub use record_store::*;
