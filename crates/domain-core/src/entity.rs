//! 带标识和审计信息的领域对象

use hse_common::{AuditInfo, UserId};

/// 有稳定标识的对象
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 作为一个整体读取和写回的聚合 (角色、工作流)
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;

    /// 存储中的 `version_c`，未做版本控制的聚合为 0
    fn version(&self) -> u64 {
        0
    }

    /// 记录一次由 `by` 发起的修改
    fn touch(&mut self, by: UserId) {
        self.audit_info_mut().update(Some(by));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        id: u32,
        audit_info: AuditInfo,
    }

    impl Entity for Note {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    impl AggregateRoot for Note {
        fn audit_info(&self) -> &AuditInfo {
            &self.audit_info
        }

        fn audit_info_mut(&mut self) -> &mut AuditInfo {
            &mut self.audit_info
        }
    }

    #[test]
    fn test_touch_records_modifier() {
        let mut note = Note {
            id: 1,
            audit_info: AuditInfo::new(Some(UserId::from(3))),
        };
        note.touch(UserId::from(8));

        assert_eq!(*note.id(), 1);
        assert_eq!(note.version(), 0);
        assert_eq!(note.audit_info().created_by, Some(UserId::from(3)));
        assert_eq!(note.audit_info().updated_by, Some(UserId::from(8)));
    }
}
