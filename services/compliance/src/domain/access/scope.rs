//! 可见范围与按范围过滤

use hse_common::{SiteId, UserId};
use serde::{Deserialize, Serialize};

use super::role::RoleCode;

/// 可见范围
///
/// 声明顺序即覆盖面从窄到宽: `Own < Site < All`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 本人负责或拥有的记录
    Own,
    /// 本站点的记录
    Site,
    /// 全部记录
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Own => "own",
            Scope::Site => "site",
            Scope::All => "all",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "own" => Ok(Scope::Own),
            "site" => Ok(Scope::Site),
            "all" => Ok(Scope::All),
            _ => Err(format!("Unknown scope: {}", s)),
        }
    }
}

/// 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// 当前操作用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: UserId,
    pub role: RoleCode,
    pub site_id: Option<SiteId>,
}

impl ActingUser {
    pub fn new(id: impl Into<UserId>, role: RoleCode, site_id: Option<SiteId>) -> Self {
        Self {
            id: id.into(),
            role,
            site_id,
        }
    }
}

/// 可按范围过滤的记录
pub trait ScopedRecord {
    /// 记录所属站点
    fn site_id(&self) -> Option<SiteId>;

    /// 记录的负责人或拥有者
    fn owner_id(&self) -> Option<UserId>;
}

/// 单条记录是否在范围内
pub fn is_in_scope<T: ScopedRecord + ?Sized>(record: &T, scope: Scope, actor: &ActingUser) -> bool {
    match scope {
        Scope::All => true,
        Scope::Site => actor.site_id.is_some() && record.site_id() == actor.site_id,
        Scope::Own => record.owner_id() == Some(actor.id),
    }
}

/// 按范围过滤记录，无副作用
pub fn filter_by_scope<T: ScopedRecord>(
    records: Vec<T>,
    scope: Scope,
    actor: &ActingUser,
) -> Vec<T> {
    match scope {
        Scope::All => records,
        _ => records
            .into_iter()
            .filter(|r| is_in_scope(r, scope, actor))
            .collect(),
    }
}
