//! 工作流生命周期领域模块

#![allow(clippy::module_inception)]

pub mod events;
pub mod repository;
pub mod status;
pub mod workflow;

pub use events::WorkflowEvent;
pub use repository::{WorkflowFilter, WorkflowRepository};
pub use status::{Priority, WorkflowAction, WorkflowStatus, WorkflowType, transition};
pub use workflow::{NewWorkflow, Workflow, WorkflowId};
