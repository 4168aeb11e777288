//! hse-event-core - 领域事件核心库
//!
//! DomainEvent trait 与事件信封

mod domain_event;

pub use domain_event::*;
