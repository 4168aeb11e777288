//! hse-domain-core - 跨模块共享的领域核心类型
//!
//! 实体 trait 与三语 (en/ar/fr) 文本值对象

mod entity;
mod localized;

pub use entity::*;
pub use localized::*;

pub use hse_common::{AuditInfo, SiteId, UserId};
