//! Resource catalog seeding and lookup.
//!
//! The catalog is seeded once at bootstrap from a fixed entry list.
//! Seeding is idempotent: resources are matched by route, and existing
//! resources only have their subresource lists refreshed.

use fordon_core::error::FordonResult;
use fordon_core::models::resource::{CreateResource, Resource, Subresource};
use fordon_core::repository::ResourceRepository;
use tracing::info;
use uuid::Uuid;

/// One entry of the bootstrap catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub title: String,
    pub route: String,
    pub icon: String,
    pub description: String,
    pub position: i64,
    pub is_public: bool,
    pub subresources: Vec<Subresource>,
}

fn sub(title: &str, route: &str, icon: &str) -> Subresource {
    Subresource {
        title: title.into(),
        route: route.into(),
        icon: icon.into(),
    }
}

fn entry(
    title: &str,
    route: &str,
    icon: &str,
    description: &str,
    position: i64,
    is_public: bool,
    subresources: Vec<Subresource>,
) -> CatalogEntry {
    CatalogEntry {
        title: title.into(),
        route: route.into(),
        icon: icon.into(),
        description: description.into(),
        position,
        is_public,
        subresources,
    }
}

/// The built-in dealership catalog.
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(
            "Dashboard",
            "/dashboard",
            "speedometer",
            "Overview of sales, stock, and open agreements",
            1,
            true,
            vec![],
        ),
        entry(
            "Vehicles",
            "/vehicles",
            "car-front",
            "Vehicle inventory management",
            2,
            true,
            vec![
                sub("Stock", "/vehicles/stock", "garage"),
                sub("Sold", "/vehicles/sold", "tag"),
                sub("Appraisals", "/vehicles/appraisals", "clipboard-data"),
            ],
        ),
        entry(
            "Customers",
            "/customers",
            "people",
            "Customer records and contact history",
            3,
            true,
            vec![],
        ),
        entry(
            "Agreements",
            "/agreements",
            "file-earmark-text",
            "Sales, purchase, and agency agreements",
            4,
            true,
            vec![
                sub("Sales", "/agreements/sales", "cart"),
                sub("Purchase", "/agreements/purchase", "wallet"),
                sub("Agency", "/agreements/agency", "briefcase"),
            ],
        ),
        entry(
            "Invoices",
            "/invoices",
            "receipt",
            "Invoicing and payment tracking",
            5,
            true,
            vec![],
        ),
        entry(
            "Payments",
            "/payments",
            "credit-card",
            "Payment provider transactions",
            6,
            true,
            vec![],
        ),
        entry(
            "Users",
            "/users",
            "person-badge",
            "User accounts within the corporation",
            7,
            true,
            vec![],
        ),
        entry(
            "Roles Management",
            "/roles",
            "shield-lock",
            "Roles and permission administration",
            8,
            true,
            vec![],
        ),
        entry(
            "Corporations",
            "/corporations",
            "building",
            "Tenant onboarding and entitlement",
            9,
            false,
            vec![],
        ),
        entry(
            "System Settings",
            "/settings",
            "gear",
            "Platform-wide configuration",
            10,
            false,
            vec![],
        ),
    ]
}

/// Seeds and queries the resource catalog.
pub struct CatalogService<R: ResourceRepository> {
    resources: R,
}

impl<R: ResourceRepository> CatalogService<R> {
    pub fn new(resources: R) -> Self {
        Self { resources }
    }

    /// Idempotently seed the catalog.
    ///
    /// Each entry is matched by route: missing resources are created,
    /// existing ones have their subresource list refreshed when the
    /// entry declares one. Returns the resolved resource ids in catalog
    /// order, for use as a default entitlement set.
    pub async fn ensure_seeded(&self, catalog: &[CatalogEntry]) -> FordonResult<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(catalog.len());

        for entry in catalog {
            match self.resources.find_by_route(&entry.route).await? {
                Some(existing) => {
                    if !entry.subresources.is_empty()
                        && existing.subresources != entry.subresources
                    {
                        self.resources
                            .update_subresources(existing.id, entry.subresources.clone())
                            .await?;
                    }
                    ids.push(existing.id);
                }
                None => {
                    let created = self
                        .resources
                        .create(CreateResource {
                            title: entry.title.clone(),
                            route: entry.route.clone(),
                            icon: entry.icon.clone(),
                            description: entry.description.clone(),
                            position: entry.position,
                            is_public: entry.is_public,
                            subresources: entry.subresources.clone(),
                        })
                        .await?;
                    info!(title = %created.title, route = %created.route, "Seeded catalog resource");
                    ids.push(created.id);
                }
            }
        }

        Ok(ids)
    }

    /// All public resources, ordered by position ascending.
    pub async fn list_public(&self) -> FordonResult<Vec<Resource>> {
        self.resources.list_public().await
    }
}
