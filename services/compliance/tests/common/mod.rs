//! 集成测试夹具：内存记录存储 + 已写入默认角色与权限

#![allow(dead_code)]

use std::sync::Arc;

use hse_adapter_record_store::InMemoryRecordStore;
use hse_common::{SiteId, UserId};
use hse_compliance::ComplianceApp;
use hse_compliance::application::CreateWorkflowCommand;
use hse_compliance::domain::access::{ActingUser, RoleCode};
use hse_compliance::domain::directory::UserRepository;
use hse_compliance::domain::workflow::{Priority, Workflow, WorkflowType};
use hse_compliance::infrastructure::{InMemoryEventPublisher, RecordStoreUserRepository};
use hse_domain_core::LocalizedText;
use serde_json::{Value, json};

pub type TestApp = ComplianceApp<InMemoryRecordStore, InMemoryEventPublisher>;

pub struct Fixture {
    pub store: Arc<InMemoryRecordStore>,
    pub events: Arc<InMemoryEventPublisher>,
    pub app: TestApp,
    pub casablanca: SiteId,
    pub marrakech: SiteId,
    pub ceo: ActingUser,
    pub manager: ActingUser,
    /// 另一站点的经理
    pub other_manager: ActingUser,
    pub amina: ActingUser,
    pub youssef: ActingUser,
}

fn record(value: Value) -> hse_ports::Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

pub fn insert_site(store: &InMemoryRecordStore, en: &str, ar: &str, fr: &str) -> SiteId {
    SiteId(store.insert(
        "site_c",
        record(json!({"name_en_c": en, "name_ar_c": ar, "name_fr_c": fr, "city_c": en})),
    ))
}

/// 写入用户记录，并经用户仓储读回作为操作人
pub async fn insert_user(
    store: &Arc<InMemoryRecordStore>,
    name: &str,
    role: RoleCode,
    site: Option<SiteId>,
) -> ActingUser {
    let id = store.insert(
        "user_c",
        record(json!({
            "full_name_en_c": name,
            "full_name_ar_c": "",
            "full_name_fr_c": name,
            "role_code_c": role.as_str(),
            "site_id_c": site.map(|s| s.0),
        })),
    );
    RecordStoreUserRepository::new(store.clone())
        .find_by_id(&UserId(id))
        .await
        .unwrap()
        .expect("user just inserted")
        .acting()
}

pub async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryRecordStore::new());
    let events = Arc::new(InMemoryEventPublisher::new());
    let app = ComplianceApp::new(store.clone(), events.clone(), 1);
    app.role_admin.seed_defaults().await.unwrap();

    let casablanca = insert_site(
        &store,
        "Casablanca Hotel",
        "فندق الدار البيضاء",
        "Hôtel Casablanca",
    );
    let marrakech = insert_site(
        &store,
        "Marrakech Kitchen",
        "مطبخ مراكش",
        "Cuisine Marrakech",
    );

    let ceo = insert_user(&store, "Karim Alaoui", RoleCode::Ceo, None).await;
    let manager = insert_user(&store, "Nadia Tazi", RoleCode::Manager, Some(casablanca)).await;
    let other_manager =
        insert_user(&store, "Omar Idrissi", RoleCode::Manager, Some(marrakech)).await;
    let amina = insert_user(&store, "Amina Benali", RoleCode::User, Some(casablanca)).await;
    let youssef = insert_user(&store, "Youssef Amrani", RoleCode::User, Some(casablanca)).await;

    Fixture {
        store,
        events,
        app,
        casablanca,
        marrakech,
        ceo,
        manager,
        other_manager,
        amina,
        youssef,
    }
}

pub fn create_command(
    actor: ActingUser,
    title: &str,
    assigned_to: Option<UserId>,
    required_approvals: Option<u32>,
) -> CreateWorkflowCommand {
    CreateWorkflowCommand {
        actor,
        title: LocalizedText::new(title, "", format!("{} (fr)", title)),
        description: LocalizedText::uniform("HACCP"),
        workflow_type: WorkflowType::SafetyInspection,
        priority: Priority::High,
        assigned_to,
        site_id: None,
        due_date: None,
        required_approvals,
    }
}

impl Fixture {
    /// 经理创建并指派给指定用户
    pub async fn assigned_workflow(&self, assignee: UserId, required: u32) -> Workflow {
        self.app
            .workflow_commands
            .handle_create(create_command(
                self.manager,
                "Cold room inspection",
                Some(assignee),
                Some(required),
            ))
            .await
            .unwrap()
    }
}
