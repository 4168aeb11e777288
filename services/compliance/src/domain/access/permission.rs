//! 权限实体与权限表

use derive_more::{Display, From};
use hse_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::role::{RoleCode, RoleId};
use super::scope::{Action, Scope};

/// 权限 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct PermissionId(pub i64);

impl std::str::FromStr for PermissionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// 业务资源 (功能区域)
pub mod resources {
    pub const AUDITS: &str = "audits";
    pub const CHECKLISTS: &str = "checklists";
    pub const INCIDENTS: &str = "incidents";
    pub const RISK_ASSESSMENTS: &str = "risk_assessments";
    pub const WORKFLOWS: &str = "workflows";
    pub const COMPLAINTS: &str = "complaints";
    pub const INSPECTIONS: &str = "inspections";
    pub const TASKS: &str = "tasks";
    pub const DOCUMENTS: &str = "documents";
    pub const USERS: &str = "users";
    pub const ROLES: &str = "roles";
    pub const SETTINGS: &str = "settings";
    pub const SITES: &str = "sites";

    /// 日常业务记录
    pub const OPERATIONAL: [&str; 9] = [
        AUDITS,
        CHECKLISTS,
        INCIDENTS,
        RISK_ASSESSMENTS,
        WORKFLOWS,
        COMPLAINTS,
        INSPECTIONS,
        TASKS,
        DOCUMENTS,
    ];

    /// 管理类资源
    pub const ADMINISTRATIVE: [&str; 4] = [USERS, ROLES, SETTINGS, SITES];
}

/// 权限表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub role: RoleCode,
    pub resource: String,
    pub action: Action,
    pub scope: Scope,
    pub allowed: bool,
}

impl PermissionEntry {
    pub fn allow(role: RoleCode, resource: &str, action: Action, scope: Scope) -> Self {
        Self {
            role,
            resource: resource.to_string(),
            action,
            scope,
            allowed: true,
        }
    }

    pub fn deny(role: RoleCode, resource: &str, action: Action) -> Self {
        Self {
            role,
            resource: resource.to_string(),
            action,
            scope: Scope::Own,
            allowed: false,
        }
    }

    fn matches(&self, role: RoleCode, resource: &str, action: Action) -> bool {
        self.role == role && self.action == action && self.resource == resource
    }
}

/// 权限实体 (持久化的权限表行)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub role_id: RoleId,
    pub role_code: RoleCode,
    pub resource: String,
    pub action: Action,
    pub scope: Scope,
    pub allowed: bool,
}

impl Permission {
    /// 由权限表行创建 (尚未持久化，id 为 0)
    pub fn from_entry(role_id: RoleId, entry: &PermissionEntry) -> Self {
        Self {
            id: PermissionId(0),
            role_id,
            role_code: entry.role,
            resource: entry.resource.clone(),
            action: entry.action,
            scope: entry.scope,
            allowed: entry.allowed,
        }
    }

    pub fn entry(&self) -> PermissionEntry {
        PermissionEntry {
            role: self.role_code,
            resource: self.resource.clone(),
            action: self.action,
            scope: self.scope,
            allowed: self.allowed,
        }
    }

    /// 权限代码，如 `workflows:update`
    pub fn code(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    /// CEO 对角色和设置的授权，撤销后将无人能再修改权限
    pub fn is_lockout_guarded(&self) -> bool {
        self.role_code == RoleCode::Ceo
            && (self.resource == resources::ROLES || self.resource == resources::SETTINGS)
    }

    /// 修改授权
    pub fn set(&mut self, allowed: bool, scope: Option<Scope>) -> AppResult<()> {
        let new_scope = scope.unwrap_or(self.scope);
        if self.is_lockout_guarded() && (!allowed || new_scope != Scope::All) {
            return Err(AppError::forbidden(format!(
                "Permission {} of the ceo role cannot be revoked or narrowed",
                self.code()
            )));
        }
        self.allowed = allowed;
        self.scope = new_scope;
        Ok(())
    }
}

/// 静态权限查找表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    entries: Vec<PermissionEntry>,
}

impl PermissionTable {
    pub fn new(entries: Vec<PermissionEntry>) -> Self {
        Self { entries }
    }

    pub fn from_permissions(permissions: &[Permission]) -> Self {
        Self::new(permissions.iter().map(Permission::entry).collect())
    }

    pub fn entries(&self) -> &[PermissionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 默认权限矩阵
    ///
    /// - CEO: 全部资源、全部操作，范围 all
    /// - Manager: 业务记录增删改查限本站点；用户和站点只读/改本站点；
    ///   角色只读；设置只读，写入显式拒绝
    /// - User: 业务记录只读/更新本人负责的；可上报事故和投诉；
    ///   工作流不可创建或删除；角色和设置全部显式拒绝
    pub fn default_matrix() -> Self {
        use resources::*;

        let mut entries = Vec::new();

        for resource in OPERATIONAL.iter().chain(ADMINISTRATIVE.iter()) {
            for action in Action::ALL {
                entries.push(PermissionEntry::allow(RoleCode::Ceo, resource, action, Scope::All));
            }
        }

        let manager = RoleCode::Manager;
        for resource in OPERATIONAL {
            for action in Action::ALL {
                entries.push(PermissionEntry::allow(manager, resource, action, Scope::Site));
            }
        }
        entries.push(PermissionEntry::allow(manager, USERS, Action::Read, Scope::Site));
        entries.push(PermissionEntry::allow(manager, USERS, Action::Update, Scope::Site));
        entries.push(PermissionEntry::allow(manager, SITES, Action::Read, Scope::Site));
        entries.push(PermissionEntry::allow(manager, ROLES, Action::Read, Scope::All));
        entries.push(PermissionEntry::allow(manager, SETTINGS, Action::Read, Scope::All));
        for action in [Action::Create, Action::Update, Action::Delete] {
            entries.push(PermissionEntry::deny(manager, SETTINGS, action));
        }

        let user = RoleCode::User;
        for resource in OPERATIONAL {
            entries.push(PermissionEntry::allow(user, resource, Action::Read, Scope::Own));
            entries.push(PermissionEntry::allow(user, resource, Action::Update, Scope::Own));
        }
        for resource in [INCIDENTS, COMPLAINTS, CHECKLISTS] {
            entries.push(PermissionEntry::allow(user, resource, Action::Create, Scope::Own));
        }
        entries.push(PermissionEntry::allow(user, USERS, Action::Read, Scope::Own));
        entries.push(PermissionEntry::allow(user, SITES, Action::Read, Scope::Site));
        for resource in [ROLES, SETTINGS] {
            for action in Action::ALL {
                entries.push(PermissionEntry::deny(user, resource, action));
            }
        }

        Self::new(entries)
    }
}

/// 解析 (角色, 资源, 操作) 的可见范围
///
/// 无匹配行返回 `None`；任一匹配行 `allowed = false` 即拒绝；
/// 否则取匹配行中最宽的范围
pub fn resolve_scope(
    table: &PermissionTable,
    role: RoleCode,
    resource: &str,
    action: Action,
) -> Option<Scope> {
    let mut resolved: Option<Scope> = None;
    for entry in table.entries.iter().filter(|e| e.matches(role, resource, action)) {
        if !entry.allowed {
            return None;
        }
        resolved = Some(resolved.map_or(entry.scope, |s| s.max(entry.scope)));
    }
    resolved
}
