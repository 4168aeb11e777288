//! 领域层

pub mod access;
pub mod directory;
pub mod workflow;
