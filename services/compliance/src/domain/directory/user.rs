//! 用户

use hse_common::{SiteId, UserId};
use hse_domain_core::{Localized, LocalizedText};
use serde::{Deserialize, Serialize};

use crate::domain::access::{ActingUser, RoleCode, RoleId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: LocalizedText,
    pub role_code: RoleCode,
    pub role_id: Option<RoleId>,
    pub site_id: Option<SiteId>,
}

impl User {
    /// 作为操作人的投影
    pub fn acting(&self) -> ActingUser {
        ActingUser {
            id: self.id,
            role: self.role_code,
            site_id: self.site_id,
        }
    }
}

impl Localized for User {
    fn localized(&self) -> &LocalizedText {
        &self.full_name
    }
}
