//! Integration tests for the Corporation repository using in-memory SurrealDB.

use fordon_core::models::corporation::CreateCorporation;
use fordon_core::models::permission::{CreatePermission, CrudFlags, PermissionSeed};
use fordon_core::models::resource::CreateResource;
use fordon_core::repository::{
    CorporationRepository, PermissionPrune, PermissionRepository, ResourceRepository,
    RoleRepository,
};
use fordon_db::repository::{
    SurrealCorporationRepository, SurrealPermissionRepository, SurrealResourceRepository,
    SurrealRoleRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create 3 catalog
/// resources.
async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Vec<Uuid>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fordon_db::run_migrations(&db).await.unwrap();

    let repo = SurrealResourceRepository::new(db.clone());
    let mut ids = Vec::new();
    for (i, (title, route, icon)) in [
        ("Vehicles", "/vehicles", "car-front"),
        ("Customers", "/customers", "people"),
        ("Invoices", "/invoices", "receipt"),
    ]
    .iter()
    .enumerate()
    {
        let resource = repo
            .create(CreateResource {
                title: (*title).into(),
                route: (*route).into(),
                icon: (*icon).into(),
                description: format!("{title} area"),
                position: i as i64 + 1,
                is_public: true,
                subresources: vec![],
            })
            .await
            .unwrap();
        ids.push(resource.id);
    }

    (db, ids)
}

fn seed(resource_id: Uuid, flags: CrudFlags) -> PermissionSeed {
    PermissionSeed {
        resource_id,
        flags,
        subresource_permissions: vec![],
    }
}

#[tokio::test]
async fn onboard_creates_corporation_system_role_and_permissions() {
    let (db, resources) = setup().await;
    let corp_repo = SurrealCorporationRepository::new(db.clone());
    let perm_repo = SurrealPermissionRepository::new(db);

    let (corp, admin) = corp_repo
        .onboard(
            CreateCorporation {
                name: "Nordic Motors".into(),
                allowed_resources: vec![resources[0], resources[1]],
                metadata: Some(serde_json::json!({"org_number": "556000-0000"})),
            },
            "Admin".into(),
            "Full access".into(),
            vec![
                seed(resources[0], CrudFlags::all_true()),
                seed(resources[1], CrudFlags::all_true()),
            ],
        )
        .await
        .unwrap();

    assert_eq!(corp.name, "Nordic Motors");
    assert!(corp.active);
    assert_eq!(corp.allowed_resources, vec![resources[0], resources[1]]);
    assert_eq!(corp.metadata["org_number"], "556000-0000");

    assert_eq!(admin.corporation_id, corp.id);
    assert_eq!(admin.name, "Admin");
    assert!(admin.is_system);

    let rows = perm_repo.list_by_role(admin.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|p| p.flags == CrudFlags::all_true()));
}

#[tokio::test]
async fn get_missing_corporation_errors() {
    let (db, _) = setup().await;
    let repo = SurrealCorporationRepository::new(db);

    let result = repo.get_by_id(Uuid::new_v4()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn replace_entitlement_adds_and_prunes_permission_rows() {
    let (db, resources) = setup().await;
    let corp_repo = SurrealCorporationRepository::new(db.clone());
    let perm_repo = SurrealPermissionRepository::new(db);

    let (corp, admin) = corp_repo
        .onboard(
            CreateCorporation {
                name: "Nordic Motors".into(),
                allowed_resources: vec![resources[0], resources[1]],
                metadata: None,
            },
            "Admin".into(),
            "Full access".into(),
            vec![
                seed(resources[0], CrudFlags::all_true()),
                seed(resources[1], CrudFlags::all_true()),
            ],
        )
        .await
        .unwrap();

    // Swap resource 1 for resource 2.
    let updated = corp_repo
        .replace_entitlement(
            corp.id,
            vec![resources[0], resources[2]],
            vec![CreatePermission {
                role_id: admin.id,
                resource_id: resources[2],
                flags: CrudFlags::all_true(),
                subresource_permissions: vec![],
            }],
            vec![PermissionPrune {
                role_id: admin.id,
                resource_ids: vec![resources[1]],
            }],
        )
        .await
        .unwrap();

    assert_eq!(updated.allowed_resources, vec![resources[0], resources[2]]);

    assert!(perm_repo.get(admin.id, resources[0]).await.unwrap().is_some());
    assert!(perm_repo.get(admin.id, resources[1]).await.unwrap().is_none());
    assert!(perm_repo.get(admin.id, resources[2]).await.unwrap().is_some());
}

#[tokio::test]
async fn replace_entitlement_keeps_existing_row_flags() {
    let (db, resources) = setup().await;
    let corp_repo = SurrealCorporationRepository::new(db.clone());
    let perm_repo = SurrealPermissionRepository::new(db);

    let (corp, admin) = corp_repo
        .onboard(
            CreateCorporation {
                name: "Nordic Motors".into(),
                allowed_resources: vec![resources[0]],
                metadata: None,
            },
            "Admin".into(),
            "Full access".into(),
            vec![seed(resources[0], CrudFlags::all_true())],
        )
        .await
        .unwrap();

    // Re-adding an already-present resource must not reset its row.
    corp_repo
        .replace_entitlement(
            corp.id,
            vec![resources[0]],
            vec![CreatePermission {
                role_id: admin.id,
                resource_id: resources[0],
                flags: CrudFlags::all_false(),
                subresource_permissions: vec![],
            }],
            vec![],
        )
        .await
        .unwrap();

    let row = perm_repo.get(admin.id, resources[0]).await.unwrap().unwrap();
    assert_eq!(row.flags, CrudFlags::all_true());
}

#[tokio::test]
async fn delete_corporation_cascades_to_roles_and_permissions() {
    let (db, resources) = setup().await;
    let corp_repo = SurrealCorporationRepository::new(db.clone());
    let role_repo = SurrealRoleRepository::new(db.clone());
    let perm_repo = SurrealPermissionRepository::new(db);

    let (corp, admin) = corp_repo
        .onboard(
            CreateCorporation {
                name: "Nordic Motors".into(),
                allowed_resources: vec![resources[0]],
                metadata: None,
            },
            "Admin".into(),
            "Full access".into(),
            vec![seed(resources[0], CrudFlags::all_true())],
        )
        .await
        .unwrap();

    corp_repo.delete(corp.id).await.unwrap();

    assert!(corp_repo.get_by_id(corp.id).await.is_err());
    assert!(role_repo.get_by_id(corp.id, admin.id).await.is_err());
    assert!(perm_repo.list_by_role(admin.id).await.unwrap().is_empty());
}
