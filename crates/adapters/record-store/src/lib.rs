//! hse-adapter-record-store - 记录存储适配器
//!
//! - [`InMemoryRecordStore`]: 进程内实现，用于本地运行和测试
//! - [`HttpRecordStore`]: 远程记录 API 的 HTTP 客户端

mod http;
mod memory;
mod query;

pub use http::*;
pub use memory::*;
