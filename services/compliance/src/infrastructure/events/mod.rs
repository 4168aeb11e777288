//! 事件发布实现

pub mod in_memory_publisher;
pub mod tracing_publisher;

pub use in_memory_publisher::InMemoryEventPublisher;
pub use tracing_publisher::TracingEventPublisher;
