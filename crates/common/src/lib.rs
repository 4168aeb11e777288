//! hse-common - 通用类型和工具库

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;
