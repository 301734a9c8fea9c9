//! Domain models for the Fordon RBAC core.
//!
//! These are the core types shared across all crates.

pub mod corporation;
pub mod permission;
pub mod principal;
pub mod resource;
pub mod role;
