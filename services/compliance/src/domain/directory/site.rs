//! 站点 (餐厅、酒店、中央厨房等经营场所)

use hse_common::SiteId;
use hse_domain_core::{Localized, LocalizedText};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: LocalizedText,
    pub city: Option<String>,
}

impl Localized for Site {
    fn localized(&self) -> &LocalizedText {
        &self.name
    }
}
