//! 基础设施层

pub mod events;
pub mod persistence;

pub use events::{InMemoryEventPublisher, TracingEventPublisher};
pub use persistence::{
    RecordStorePermissionRepository, RecordStoreRoleRepository, RecordStoreSiteRepository,
    RecordStoreUserRepository, RecordStoreWorkflowRepository,
};
