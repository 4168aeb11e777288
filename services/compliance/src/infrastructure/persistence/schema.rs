//! 记录存储中的表与列
//!
//! 多语言字段按语言拆成三列，统一经 [`LocalizedColumns`] 读写

use hse_domain_core::LocalizedText;
use hse_ports::{Record, get_string};
use serde_json::Value;

/// 一个多语言字段对应的三列
#[derive(Debug, Clone, Copy)]
pub struct LocalizedColumns {
    pub en: &'static str,
    pub ar: &'static str,
    pub fr: &'static str,
}

impl LocalizedColumns {
    pub const fn new(en: &'static str, ar: &'static str, fr: &'static str) -> Self {
        Self { en, ar, fr }
    }

    pub fn names(&self) -> [&'static str; 3] {
        [self.en, self.ar, self.fr]
    }

    pub fn read(&self, record: &Record) -> LocalizedText {
        LocalizedText::new(
            get_string(record, self.en),
            get_string(record, self.ar),
            get_string(record, self.fr),
        )
    }

    pub fn write(&self, record: &mut Record, text: &LocalizedText) {
        record.insert(self.en.to_string(), Value::from(text.en.as_str()));
        record.insert(self.ar.to_string(), Value::from(text.ar.as_str()));
        record.insert(self.fr.to_string(), Value::from(text.fr.as_str()));
    }
}

pub(crate) fn field_list(plain: &[&str], localized: &[LocalizedColumns]) -> Vec<String> {
    plain
        .iter()
        .copied()
        .chain(localized.iter().flat_map(|c| c.names()))
        .map(str::to_string)
        .collect()
}

pub mod role_c {
    use super::LocalizedColumns;

    pub const TABLE: &str = "role_c";
    pub const NAME: LocalizedColumns =
        LocalizedColumns::new("name_en_c", "name_ar_c", "name_fr_c");
    pub const CODE: &str = "code_c";
    pub const SCOPE_LEVEL: &str = "scope_level_c";
    pub const IS_SYSTEM_ROLE: &str = "is_system_role_c";
    pub const CREATED_AT: &str = "created_at_c";
    pub const UPDATED_AT: &str = "updated_at_c";

    pub fn fields() -> Vec<String> {
        super::field_list(
            &[CODE, SCOPE_LEVEL, IS_SYSTEM_ROLE, CREATED_AT, UPDATED_AT],
            &[NAME],
        )
    }
}

pub mod permission_c {
    pub const TABLE: &str = "permission_c";
    /// 关联 `role_c`
    pub const ROLE_ID: &str = "role_id_c";
    pub const ROLE_CODE: &str = "role_code_c";
    pub const RESOURCE: &str = "resource_c";
    pub const ACTION: &str = "action_c";
    pub const SCOPE: &str = "scope_c";
    pub const ALLOWED: &str = "allowed_c";

    pub fn fields() -> Vec<String> {
        super::field_list(&[ROLE_ID, ROLE_CODE, RESOURCE, ACTION, SCOPE, ALLOWED], &[])
    }
}

pub mod workflow_c {
    use super::LocalizedColumns;

    pub const TABLE: &str = "workflow_c";
    pub const TITLE: LocalizedColumns =
        LocalizedColumns::new("title_en_c", "title_ar_c", "title_fr_c");
    pub const DESCRIPTION: LocalizedColumns = LocalizedColumns::new(
        "description_en_c",
        "description_ar_c",
        "description_fr_c",
    );
    pub const COMPLETION_NOTES: LocalizedColumns = LocalizedColumns::new(
        "completion_notes_en_c",
        "completion_notes_ar_c",
        "completion_notes_fr_c",
    );
    pub const TYPE: &str = "type_c";
    pub const STATUS: &str = "status_c";
    pub const PRIORITY: &str = "priority_c";
    /// 关联 `user_c`
    pub const ASSIGNED_TO: &str = "assigned_to_c";
    /// 关联 `site_c`
    pub const SITE_ID: &str = "site_id_c";
    pub const CREATED_BY: &str = "created_by_c";
    pub const DUE_DATE: &str = "due_date_c";
    pub const REQUIRED_APPROVALS: &str = "required_approvals_c";
    pub const APPROVAL_COUNT: &str = "approval_count_c";
    /// 逗号分隔的审批人 ID
    pub const APPROVED_BY: &str = "approved_by_c";
    pub const ASSIGNED_AT: &str = "assigned_at_c";
    pub const STARTED_AT: &str = "started_at_c";
    pub const COMPLETED_AT: &str = "completed_at_c";
    pub const APPROVED_AT: &str = "approved_at_c";
    pub const REJECTED_AT: &str = "rejected_at_c";
    pub const REJECTED_BY: &str = "rejected_by_c";
    pub const REJECTION_REASON: &str = "rejection_reason_c";
    pub const COMPLETION_PERCENTAGE: &str = "completion_percentage_c";
    pub const VERSION: &str = "version_c";
    pub const CREATED_AT: &str = "created_at_c";
    pub const UPDATED_AT: &str = "updated_at_c";
    pub const UPDATED_BY: &str = "updated_by_c";

    pub fn fields() -> Vec<String> {
        super::field_list(
            &[
                TYPE,
                STATUS,
                PRIORITY,
                ASSIGNED_TO,
                SITE_ID,
                CREATED_BY,
                DUE_DATE,
                REQUIRED_APPROVALS,
                APPROVAL_COUNT,
                APPROVED_BY,
                ASSIGNED_AT,
                STARTED_AT,
                COMPLETED_AT,
                APPROVED_AT,
                REJECTED_AT,
                REJECTED_BY,
                REJECTION_REASON,
                COMPLETION_PERCENTAGE,
                VERSION,
                CREATED_AT,
                UPDATED_AT,
                UPDATED_BY,
            ],
            &[TITLE, DESCRIPTION, COMPLETION_NOTES],
        )
    }
}

pub mod user_c {
    use super::LocalizedColumns;

    pub const TABLE: &str = "user_c";
    pub const FULL_NAME: LocalizedColumns =
        LocalizedColumns::new("full_name_en_c", "full_name_ar_c", "full_name_fr_c");
    pub const ROLE_CODE: &str = "role_code_c";
    pub const ROLE_ID: &str = "role_id_c";
    pub const SITE_ID: &str = "site_id_c";

    pub fn fields() -> Vec<String> {
        super::field_list(&[ROLE_CODE, ROLE_ID, SITE_ID], &[FULL_NAME])
    }
}

pub mod site_c {
    use super::LocalizedColumns;

    pub const TABLE: &str = "site_c";
    pub const NAME: LocalizedColumns =
        LocalizedColumns::new("name_en_c", "name_ar_c", "name_fr_c");
    pub const CITY: &str = "city_c";

    pub fn fields() -> Vec<String> {
        super::field_list(&[CITY], &[NAME])
    }
}

/// 解析枚举列，未知值视为数据损坏
pub(crate) fn parse_column<T>(record: &Record, column: &str) -> hse_errors::AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw = hse_ports::get_str(record, column).unwrap_or_default();
    raw.parse().map_err(|e: String| {
        hse_errors::AppError::internal(format!("Invalid value in {}: {}", column, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_columns_read_write() {
        let mut record = Record::new();
        let text = LocalizedText::new("Fire drill", "تمرين الحريق", "Exercice incendie");
        workflow_c::TITLE.write(&mut record, &text);

        assert_eq!(record.get("title_ar_c"), Some(&Value::from("تمرين الحريق")));
        assert_eq!(workflow_c::TITLE.read(&record), text);
    }

    #[test]
    fn test_field_lists_include_localized_columns() {
        let fields = role_c::fields();
        assert!(fields.contains(&"name_fr_c".to_string()));
        assert!(fields.contains(&"code_c".to_string()));
        assert!(workflow_c::fields().contains(&"version_c".to_string()));
    }
}
