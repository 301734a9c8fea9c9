//! Resource catalog domain model.
//!
//! Resources are the addressable application areas (Vehicles, Customers,
//! Agreements, ...) that permissions are granted against. The catalog is
//! seeded once at bootstrap and is effectively read-only afterwards; only
//! subresource lists may be refreshed by re-seeding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    /// Display title, unique across the catalog (case-insensitive).
    pub title: String,
    /// Frontend route, globally unique. Also the join key used when
    /// re-seeding the catalog.
    pub route: String,
    /// Icon key, globally unique.
    pub icon: String,
    pub description: String,
    /// Sort order in any listing, ascending.
    pub position: i64,
    /// Whether this resource may ever be granted to a corporation.
    /// Non-public resources are reserved for the root tenant.
    pub is_public: bool,
    pub has_subresources: bool,
    pub subresources: Vec<Subresource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named sub-area of a resource.
///
/// Subresources carry no identifier of their own; the route is the join
/// key against permission subresource entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subresource {
    pub title: String,
    pub route: String,
    pub icon: String,
}

/// Fields required to create a new catalog resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResource {
    pub title: String,
    pub route: String,
    pub icon: String,
    pub description: String,
    pub position: i64,
    pub is_public: bool,
    pub subresources: Vec<Subresource>,
}
