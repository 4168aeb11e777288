//! 通用类型定义

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 用户 ID
///
/// 记录存储为每条记录分配整数主键，用户表 (`user_c`) 也不例外
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// 站点 ID (餐厅、酒店、厨房等经营场所)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct SiteId(pub i64);

impl SiteId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for SiteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// 审计信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

impl AuditInfo {
    pub fn new(user_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        }
    }

    pub fn update(&mut self, user_id: Option<UserId>) {
        self.updated_at = Utc::now();
        self.updated_by = user_id;
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new(None)
    }
}

/// 分页参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// 超出范围的页码停在 `u32::MAX`
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// 总数未知时为已知下限 (偏移量 + 本页条数)
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    more: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        let more = pagination.page_size > 0
            && u64::from(pagination.page) < total.div_ceil(u64::from(pagination.page_size));
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            more,
        }
    }

    /// 存储未返回总数时使用：本页取满即认为还有下一页
    pub fn open_ended(items: Vec<T>, pagination: &Pagination) -> Self {
        let fetched = items.len() as u64;
        Self {
            more: pagination.page_size > 0 && fetched == u64::from(pagination.page_size),
            total: u64::from(pagination.offset()) + fetched,
            items,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    /// 保留分页信息，替换本页内容
    pub fn with_items<U>(self, items: Vec<U>) -> PagedResult<U> {
        PagedResult {
            items,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            more: self.more,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// 是否还有下一页
    pub fn has_more(&self) -> bool {
        self.more
    }
}
