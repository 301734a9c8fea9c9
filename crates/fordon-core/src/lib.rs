//! Fordon Core — domain models, repository traits, and error taxonomy
//! for the dealership management RBAC core.

pub mod error;
pub mod models;
pub mod repository;
