//! 记录存储目录仓储实现 (用户、站点只读)

use std::sync::Arc;

use async_trait::async_trait;
use hse_common::{SiteId, UserId};
use hse_errors::{AppError, AppResult};
use hse_ports::{
    Condition, FetchQuery, ID_FIELD, Record, RecordStore, SortDirection, get_str, lookup_id,
    record_id,
};

use super::paging::fetch_all;
use super::schema::{parse_column, site_c, user_c};
use crate::domain::access::RoleId;
use crate::domain::directory::{Site, SiteRepository, User, UserRepository};

pub struct RecordStoreUserRepository<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> RecordStoreUserRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

fn user_from_record(record: &Record) -> AppResult<User> {
    let id = record_id(record)
        .ok_or_else(|| AppError::internal("User record without Id"))?;
    Ok(User {
        id: UserId(id),
        full_name: user_c::FULL_NAME.read(record),
        role_code: parse_column(record, user_c::ROLE_CODE)?,
        role_id: lookup_id(record, user_c::ROLE_ID).map(RoleId),
        site_id: lookup_id(record, user_c::SITE_ID).map(SiteId),
    })
}

#[async_trait]
impl<S: RecordStore> UserRepository for RecordStoreUserRepository<S> {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        self.store
            .get_record_by_id(user_c::TABLE, id.0, &user_c::fields())
            .await?
            .into_data()?
            .as_ref()
            .map(user_from_record)
            .transpose()
    }

    async fn list_by_site(&self, site_id: &SiteId) -> AppResult<Vec<User>> {
        let query = FetchQuery::new()
            .fields(user_c::fields())
            .filter(Condition::equal_to(user_c::SITE_ID, site_id.0))
            .order_by(ID_FIELD, SortDirection::Asc);
        fetch_all(self.store.as_ref(), user_c::TABLE, query, user_from_record).await
    }
}

pub struct RecordStoreSiteRepository<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> RecordStoreSiteRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

fn site_from_record(record: &Record) -> AppResult<Site> {
    let id = record_id(record)
        .ok_or_else(|| AppError::internal("Site record without Id"))?;
    Ok(Site {
        id: SiteId(id),
        name: site_c::NAME.read(record),
        city: get_str(record, site_c::CITY)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
    })
}

#[async_trait]
impl<S: RecordStore> SiteRepository for RecordStoreSiteRepository<S> {
    async fn find_by_id(&self, id: &SiteId) -> AppResult<Option<Site>> {
        self.store
            .get_record_by_id(site_c::TABLE, id.0, &site_c::fields())
            .await?
            .into_data()?
            .as_ref()
            .map(site_from_record)
            .transpose()
    }

    async fn list(&self) -> AppResult<Vec<Site>> {
        let query = FetchQuery::new()
            .fields(site_c::fields())
            .order_by(ID_FIELD, SortDirection::Asc);
        fetch_all(self.store.as_ref(), site_c::TABLE, query, site_from_record).await
    }
}
