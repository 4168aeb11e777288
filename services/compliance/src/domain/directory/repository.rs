//! 目录仓储接口

use async_trait::async_trait;
use hse_common::{SiteId, UserId};
use hse_errors::AppResult;

use super::site::Site;
use super::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// 站点下的全部用户
    async fn list_by_site(&self, site_id: &SiteId) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait SiteRepository: Send + Sync {
    async fn find_by_id(&self, id: &SiteId) -> AppResult<Option<Site>>;

    async fn list(&self) -> AppResult<Vec<Site>>;
}
