//! 工作流应用层模块

pub mod commands;
pub mod handlers;
pub mod queries;
pub mod query_handlers;

pub use commands::*;
pub use handlers::{EVENT_CONTEXT, WorkflowCommandHandler};
pub use queries::{WorkflowStats, WorkflowView};
pub use query_handlers::WorkflowQueryHandler;
