//! 角色实体

use derive_more::{Display, From};
use hse_common::AuditInfo;
use hse_domain_core::{AggregateRoot, Entity, Localized, LocalizedText};
use hse_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::scope::Scope;

/// 角色 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct RoleId(pub i64);

impl std::str::FromStr for RoleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// 角色代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCode {
    Ceo,
    Manager,
    User,
}

impl RoleCode {
    pub const ALL: [RoleCode; 3] = [RoleCode::Ceo, RoleCode::Manager, RoleCode::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::Ceo => "ceo",
            RoleCode::Manager => "manager",
            RoleCode::User => "user",
        }
    }

    /// 可以审批、驳回和指派工作流的角色
    pub fn is_supervisor(&self) -> bool {
        matches!(self, RoleCode::Ceo | RoleCode::Manager)
    }

    /// 系统角色的默认可见范围
    pub fn default_scope(&self) -> Scope {
        match self {
            RoleCode::Ceo => Scope::All,
            RoleCode::Manager => Scope::Site,
            RoleCode::User => Scope::Own,
        }
    }

    /// 系统角色的三语名称
    pub fn display_name(&self) -> LocalizedText {
        match self {
            RoleCode::Ceo => {
                LocalizedText::new("Chief Executive Officer", "الرئيس التنفيذي", "Directeur général")
            }
            RoleCode::Manager => LocalizedText::new("Manager", "مدير", "Responsable"),
            RoleCode::User => LocalizedText::new("User", "مستخدم", "Utilisateur"),
        }
    }
}

impl std::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ceo" => Ok(RoleCode::Ceo),
            "manager" => Ok(RoleCode::Manager),
            "user" => Ok(RoleCode::User),
            _ => Err(format!("Unknown role code: {}", s)),
        }
    }
}

/// 角色实体
///
/// 系统角色由种子数据写入，代码和范围不可修改，只能在管理设置中改名
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: LocalizedText,
    pub code: RoleCode,
    pub scope_level: Scope,
    pub is_system_role: bool,
    pub audit_info: AuditInfo,
}

impl Role {
    /// 创建系统角色 (尚未持久化，id 为 0)
    pub fn system(code: RoleCode) -> Self {
        Self {
            id: RoleId(0),
            name: code.display_name(),
            code,
            scope_level: code.default_scope(),
            is_system_role: true,
            audit_info: AuditInfo::default(),
        }
    }

    /// 修改显示名称
    pub fn rename(&mut self, name: LocalizedText) -> AppResult<()> {
        if name.is_blank() {
            return Err(AppError::validation("Role name cannot be empty"));
        }
        self.name = name;
        self.audit_info.update(None);
        Ok(())
    }

    /// 修改可见范围 (仅非系统角色)
    pub fn change_scope(&mut self, scope: Scope) -> AppResult<()> {
        if self.is_system_role {
            return Err(AppError::forbidden("System role scope cannot be changed"));
        }
        self.scope_level = scope;
        self.audit_info.update(None);
        Ok(())
    }
}

impl Localized for Role {
    fn localized(&self) -> &LocalizedText {
        &self.name
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Role {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hse_domain_core::{Language, pick};

    #[test]
    fn test_system_role() {
        let role = Role::system(RoleCode::Manager);
        assert!(role.is_system_role);
        assert_eq!(role.scope_level, Scope::Site);
        assert_eq!(pick(&role, Language::Fr), "Responsable");
        assert_eq!(pick(&role, Language::Ar), "مدير");
    }

    #[test]
    fn test_rename_rejects_blank() {
        let mut role = Role::system(RoleCode::User);
        assert!(role.rename(LocalizedText::uniform(" ")).is_err());
        role.rename(LocalizedText::new("Operator", "", "Opérateur")).unwrap();
        assert_eq!(pick(&role, Language::Ar), "Operator");
    }

    #[test]
    fn test_system_role_scope_is_fixed() {
        let mut role = Role::system(RoleCode::Ceo);
        let err = role.change_scope(Scope::Own).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(role.scope_level, Scope::All);
    }

    #[test]
    fn test_role_code_parse() {
        assert_eq!("CEO".parse::<RoleCode>().unwrap(), RoleCode::Ceo);
        assert!("admin".parse::<RoleCode>().is_err());
        assert!(RoleCode::Manager.is_supervisor());
        assert!(!RoleCode::User.is_supervisor());
    }
}
