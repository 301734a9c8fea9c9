//! SurrealDB repository implementations.

mod corporation;
mod permission;
mod resource;
mod role;

pub use corporation::SurrealCorporationRepository;
pub use permission::SurrealPermissionRepository;
pub use resource::SurrealResourceRepository;
pub use role::SurrealRoleRepository;
