//! Fordon Authz — the RBAC core of the dealership management system.
//!
//! Provides catalog seeding, corporation entitlement, role
//! administration, the permission matrix, and the per-request
//! authorization gate.

pub mod catalog;
pub mod config;
pub mod error;
pub mod service;

pub use catalog::{CatalogEntry, CatalogService, default_catalog};
pub use config::RbacConfig;
pub use error::AuthzError;
pub use service::{Decision, Denial, DenyCause, RbacService};
