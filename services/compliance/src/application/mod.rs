//! 应用层模块

pub mod access;
pub mod role;
pub mod workflow;

pub use access::AccessControlService;
pub use role::{RenameRoleCommand, RoleAdminHandler, SeedReport, SetPermissionCommand};
pub use workflow::{
    ApproveWorkflowCommand, AssignWorkflowCommand, CompleteWorkflowCommand,
    CreateWorkflowCommand, DeleteWorkflowCommand, RejectWorkflowCommand,
    ResubmitWorkflowCommand, StartWorkflowCommand, WorkflowCommandHandler,
    WorkflowQueryHandler, WorkflowStats, WorkflowView,
};
