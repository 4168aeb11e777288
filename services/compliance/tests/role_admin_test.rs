//! 角色与权限设置集成测试

mod common;

use common::fixture;
use hse_compliance::application::{RenameRoleCommand, SetPermissionCommand};
use hse_compliance::domain::access::{
    Action, Permission, PermissionId, PermissionRepository, PermissionTable, RoleCode,
    RoleRepository, Scope, resources,
};
use hse_compliance::infrastructure::{RecordStorePermissionRepository, RecordStoreRoleRepository};
use hse_domain_core::LocalizedText;
use hse_errors::AppError;

async fn stored_permission(
    fx: &common::Fixture,
    role: RoleCode,
    resource: &str,
    action: Action,
) -> Permission {
    RecordStorePermissionRepository::new(fx.store.clone())
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.role_code == role && p.resource == resource && p.action == action)
        .expect("seeded permission")
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let fx = fixture().await;

    assert_eq!(fx.store.count("role_c"), 3);
    assert_eq!(
        fx.store.count("permission_c"),
        PermissionTable::default_matrix().len()
    );

    let again = fx.app.role_admin.seed_defaults().await.unwrap();
    assert!(again.is_noop());
    assert_eq!(fx.store.count("role_c"), 3);
    assert_eq!(
        fx.store.count("permission_c"),
        PermissionTable::default_matrix().len()
    );

    let roles = RecordStoreRoleRepository::new(fx.store.clone());
    for code in RoleCode::ALL {
        let role = roles.find_by_code(code).await.unwrap().unwrap();
        assert!(role.is_system_role);
    }
}

#[tokio::test]
async fn test_seed_restores_missing_rows_only() {
    let fx = fixture().await;
    let permission =
        stored_permission(&fx, RoleCode::Manager, resources::TASKS, Action::Read).await;

    let revoked = fx
        .app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.ceo,
            permission_id: permission.id,
            allowed: false,
            scope: None,
        })
        .await
        .unwrap();
    assert!(!revoked.allowed);

    let report = fx.app.role_admin.seed_defaults().await.unwrap();
    assert!(report.is_noop());

    let after = stored_permission(&fx, RoleCode::Manager, resources::TASKS, Action::Read).await;
    assert!(!after.allowed);
}

#[tokio::test]
async fn test_rename_role_requires_roles_update() {
    let fx = fixture().await;
    let roles = RecordStoreRoleRepository::new(fx.store.clone());
    let manager_role = roles.find_by_code(RoleCode::Manager).await.unwrap().unwrap();
    let name = LocalizedText::new("Site Manager", "مدير الموقع", "Responsable de site");

    let refused = fx
        .app
        .role_admin
        .rename_role(RenameRoleCommand {
            actor: fx.manager,
            role_id: manager_role.id,
            name: name.clone(),
        })
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    let renamed = fx
        .app
        .role_admin
        .rename_role(RenameRoleCommand {
            actor: fx.ceo,
            role_id: manager_role.id,
            name: name.clone(),
        })
        .await
        .unwrap();
    assert_eq!(renamed.name, name);

    let reloaded = roles.find_by_id(&manager_role.id).await.unwrap().unwrap();
    assert_eq!(reloaded.name.fr, "Responsable de site");
    assert_eq!(reloaded.code, RoleCode::Manager);

    let blank = fx
        .app
        .role_admin
        .rename_role(RenameRoleCommand {
            actor: fx.ceo,
            role_id: manager_role.id,
            name: LocalizedText::default(),
        })
        .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_ceo_admin_grants_cannot_be_revoked() {
    let fx = fixture().await;
    let guarded = stored_permission(&fx, RoleCode::Ceo, resources::SETTINGS, Action::Update).await;

    let revoke = fx
        .app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.ceo,
            permission_id: guarded.id,
            allowed: false,
            scope: None,
        })
        .await;
    assert!(matches!(revoke, Err(AppError::Forbidden(_))));

    let narrow = fx
        .app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.ceo,
            permission_id: guarded.id,
            allowed: true,
            scope: Some(Scope::Site),
        })
        .await;
    assert!(matches!(narrow, Err(AppError::Forbidden(_))));

    let scope = fx
        .app
        .access
        .resolve_scope(&fx.ceo, resources::SETTINGS, Action::Update)
        .await
        .unwrap();
    assert_eq!(scope, Some(Scope::All));
}

#[tokio::test]
async fn test_manager_cannot_change_permissions() {
    let fx = fixture().await;
    let permission =
        stored_permission(&fx, RoleCode::User, resources::WORKFLOWS, Action::Read).await;

    let refused = fx
        .app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.manager,
            permission_id: permission.id,
            allowed: true,
            scope: Some(Scope::All),
        })
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_narrowed_permission_takes_effect() {
    let fx = fixture().await;
    let permission =
        stored_permission(&fx, RoleCode::Manager, resources::WORKFLOWS, Action::Read).await;
    assert_eq!(permission.scope, Scope::Site);

    fx.app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.ceo,
            permission_id: permission.id,
            allowed: true,
            scope: Some(Scope::Own),
        })
        .await
        .unwrap();

    let scope = fx
        .app
        .access
        .resolve_scope(&fx.manager, resources::WORKFLOWS, Action::Read)
        .await
        .unwrap();
    assert_eq!(scope, Some(Scope::Own));

    let missing = fx
        .app
        .role_admin
        .set_permission(SetPermissionCommand {
            actor: fx.ceo,
            permission_id: PermissionId(9999),
            allowed: true,
            scope: None,
        })
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
