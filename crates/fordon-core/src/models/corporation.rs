//! Corporation (tenant) domain model.
//!
//! Corporations provide full data isolation: every role and permission
//! row is scoped to exactly one corporation. The `allowed_resources`
//! entitlement set gates which catalog resources the corporation may
//! ever grant permissions on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corporation {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    /// Catalog resource ids this corporation is entitled to.
    pub allowed_resources: Vec<Uuid>,
    /// Arbitrary onboarding metadata (org number, contact details, ...).
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new corporation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCorporation {
    pub name: String,
    pub allowed_resources: Vec<Uuid>,
    pub metadata: Option<serde_json::Value>,
}
