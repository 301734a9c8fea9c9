//! Integration tests for the resource catalog repository using in-memory SurrealDB.

use fordon_core::error::FordonError;
use fordon_core::models::resource::{CreateResource, Subresource};
use fordon_core::repository::ResourceRepository;
use fordon_db::repository::SurrealResourceRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fordon_db::run_migrations(&db).await.unwrap();
    db
}

fn vehicles() -> CreateResource {
    CreateResource {
        title: "Vehicles".into(),
        route: "/vehicles".into(),
        icon: "car-front".into(),
        description: "Vehicle inventory management".into(),
        position: 2,
        is_public: true,
        subresources: vec![
            Subresource {
                title: "Stock".into(),
                route: "/vehicles/stock".into(),
                icon: "garage".into(),
            },
            Subresource {
                title: "Sold".into(),
                route: "/vehicles/sold".into(),
                icon: "tag".into(),
            },
        ],
    }
}

fn customers() -> CreateResource {
    CreateResource {
        title: "Customers".into(),
        route: "/customers".into(),
        icon: "people".into(),
        description: "Customer records".into(),
        position: 3,
        is_public: true,
        subresources: vec![],
    }
}

fn settings() -> CreateResource {
    CreateResource {
        title: "System Settings".into(),
        route: "/settings".into(),
        icon: "gear".into(),
        description: "Platform-wide configuration".into(),
        position: 10,
        is_public: false,
        subresources: vec![],
    }
}

#[tokio::test]
async fn create_and_get_resource() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let created = repo.create(vehicles()).await.unwrap();
    assert_eq!(created.title, "Vehicles");
    assert_eq!(created.route, "/vehicles");
    assert!(created.has_subresources);
    assert_eq!(created.subresources.len(), 2);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.subresources, created.subresources);
}

#[tokio::test]
async fn resource_without_subresources_flags_it() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let created = repo.create(customers()).await.unwrap();
    assert!(!created.has_subresources);
    assert!(created.subresources.is_empty());
}

#[tokio::test]
async fn find_by_route() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let created = repo.create(vehicles()).await.unwrap();

    let found = repo.find_by_route("/vehicles").await.unwrap();
    assert_eq!(found.unwrap().id, created.id);

    let missing = repo.find_by_route("/nonexistent").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn find_by_title_is_case_insensitive() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let created = repo.create(vehicles()).await.unwrap();

    for title in ["Vehicles", "vehicles", "VEHICLES", "vEhIcLeS"] {
        let found = repo.find_by_title(title).await.unwrap();
        assert_eq!(found.unwrap().id, created.id, "lookup failed for {title}");
    }

    let missing = repo.find_by_title("Spaceships").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn duplicate_route_rejected() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    repo.create(vehicles()).await.unwrap();

    let mut dup = vehicles();
    dup.title = "Fleet".into();
    dup.icon = "truck".into();
    let result = repo.create(dup).await;
    assert!(
        matches!(result, Err(FordonError::Conflict { .. })),
        "duplicate route should surface as a conflict"
    );
}

#[tokio::test]
async fn duplicate_title_rejected_case_insensitively() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    repo.create(vehicles()).await.unwrap();

    let mut dup = customers();
    dup.title = "VEHICLES".into();
    let result = repo.create(dup).await;
    assert!(
        matches!(result, Err(FordonError::Conflict { .. })),
        "case-variant duplicate title should surface as a conflict"
    );
}

#[tokio::test]
async fn list_public_excludes_reserved_and_orders_by_position() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    repo.create(customers()).await.unwrap();
    repo.create(settings()).await.unwrap();
    repo.create(vehicles()).await.unwrap();

    let public = repo.list_public().await.unwrap();
    let titles: Vec<&str> = public.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Vehicles", "Customers"]);
}

#[tokio::test]
async fn list_by_ids_orders_by_position_and_skips_missing() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let c = repo.create(customers()).await.unwrap();
    let v = repo.create(vehicles()).await.unwrap();
    let ghost = uuid::Uuid::new_v4();

    let listed = repo.list_by_ids(&[c.id, ghost, v.id]).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![v.id, c.id]); // position 2 before position 3

    let empty = repo.list_by_ids(&[]).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn update_subresources_replaces_the_list() {
    let db = setup().await;
    let repo = SurrealResourceRepository::new(db);

    let created = repo.create(vehicles()).await.unwrap();

    let refreshed = repo
        .update_subresources(
            created.id,
            vec![
                Subresource {
                    title: "Stock".into(),
                    route: "/vehicles/stock".into(),
                    icon: "garage".into(),
                },
                Subresource {
                    title: "Sold".into(),
                    route: "/vehicles/sold".into(),
                    icon: "tag".into(),
                },
                Subresource {
                    title: "Appraisals".into(),
                    route: "/vehicles/appraisals".into(),
                    icon: "clipboard-data".into(),
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(refreshed.subresources.len(), 3);
    assert!(refreshed.has_subresources);
    assert_eq!(refreshed.subresources[2].route, "/vehicles/appraisals");
}
