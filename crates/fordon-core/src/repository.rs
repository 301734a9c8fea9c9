//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Corporation-scoped repositories
//! require a `corporation_id` parameter to enforce tenant isolation.
//! Operations that touch multiple documents (onboarding, entitlement
//! replacement, role deletion) are single transactional calls so that
//! partial provisioning is never observable.

use uuid::Uuid;

use crate::error::FordonResult;
use crate::models::{
    corporation::{Corporation, CreateCorporation},
    permission::{CreatePermission, Permission, PermissionSeed},
    resource::{CreateResource, Resource, Subresource},
    role::{CreateRole, Role, UpdateRole},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Permission rows to remove from one role during entitlement
/// reconciliation.
#[derive(Debug, Clone)]
pub struct PermissionPrune {
    pub role_id: Uuid,
    pub resource_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Resource catalog (global scope)
// ---------------------------------------------------------------------------

pub trait ResourceRepository: Send + Sync {
    fn create(&self, input: CreateResource) -> impl Future<Output = FordonResult<Resource>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FordonResult<Resource>> + Send;
    /// Lookup by route; `None` when no resource matches.
    fn find_by_route(
        &self,
        route: &str,
    ) -> impl Future<Output = FordonResult<Option<Resource>>> + Send;
    /// Case-insensitive lookup by display title; `None` when no resource
    /// matches. Used by the authorization gate.
    fn find_by_title(
        &self,
        title: &str,
    ) -> impl Future<Output = FordonResult<Option<Resource>>> + Send;
    /// All public resources, ordered by position ascending.
    fn list_public(&self) -> impl Future<Output = FordonResult<Vec<Resource>>> + Send;
    /// The subset of the given ids that exist, ordered by position
    /// ascending. Missing ids are silently absent from the result.
    fn list_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = FordonResult<Vec<Resource>>> + Send;
    /// Replace the declared subresource list (catalog re-seed refresh).
    fn update_subresources(
        &self,
        id: Uuid,
        subresources: Vec<Subresource>,
    ) -> impl Future<Output = FordonResult<Resource>> + Send;
}

// ---------------------------------------------------------------------------
// Corporation (tenant) and entitlement
// ---------------------------------------------------------------------------

pub trait CorporationRepository: Send + Sync {
    /// Onboard a corporation: create the corporation, its system role,
    /// and the role's default permission rows in one transaction. The
    /// seeds receive the generated role id.
    fn onboard(
        &self,
        corporation: CreateCorporation,
        system_role_name: String,
        system_role_description: String,
        permissions: Vec<PermissionSeed>,
    ) -> impl Future<Output = FordonResult<(Corporation, Role)>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FordonResult<Corporation>> + Send;

    /// Replace the entitlement set and reconcile permission rows in one
    /// transaction: `additions` are created where absent, `prunes` are
    /// hard-deleted.
    fn replace_entitlement(
        &self,
        id: Uuid,
        allowed_resources: Vec<Uuid>,
        additions: Vec<CreatePermission>,
        prunes: Vec<PermissionPrune>,
    ) -> impl Future<Output = FordonResult<Corporation>> + Send;

    /// Delete the corporation together with all its roles and their
    /// permission rows.
    fn delete(&self, id: Uuid) -> impl Future<Output = FordonResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Roles (corporation-scoped)
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    /// Create a role and its initial permission rows in one transaction.
    /// The seeds receive the generated role id.
    fn create(
        &self,
        input: CreateRole,
        permissions: Vec<PermissionSeed>,
    ) -> impl Future<Output = FordonResult<Role>> + Send;
    fn get_by_id(
        &self,
        corporation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FordonResult<Role>> + Send;
    /// The corporation's system role, if already provisioned.
    fn find_system_role(
        &self,
        corporation_id: Uuid,
    ) -> impl Future<Output = FordonResult<Option<Role>>> + Send;
    fn update(
        &self,
        corporation_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = FordonResult<Role>> + Send;
    /// Delete the role together with its permission rows.
    fn delete(
        &self,
        corporation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FordonResult<()>> + Send;
    fn list(
        &self,
        corporation_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = FordonResult<PaginatedResult<Role>>> + Send;
    /// All roles of the corporation, unpaginated. Used by entitlement
    /// reconciliation.
    fn list_all(
        &self,
        corporation_id: Uuid,
    ) -> impl Future<Output = FordonResult<Vec<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Permission matrix
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Create rows that do not exist yet, in one transaction. Existing
    /// (role, resource) rows are left untouched.
    fn create_many_if_absent(
        &self,
        inputs: Vec<CreatePermission>,
    ) -> impl Future<Output = FordonResult<()>> + Send;

    /// Create-or-replace each (role, resource) row, in one transaction.
    fn upsert_many(
        &self,
        inputs: Vec<CreatePermission>,
    ) -> impl Future<Output = FordonResult<()>> + Send;

    /// The row for one (role, resource) pair; `None` means no access.
    fn get(
        &self,
        role_id: Uuid,
        resource_id: Uuid,
    ) -> impl Future<Output = FordonResult<Option<Permission>>> + Send;

    fn list_by_role(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = FordonResult<Vec<Permission>>> + Send;

    /// Hard-delete the role's rows for the given resources.
    fn delete_for_resources(
        &self,
        role_id: Uuid,
        resource_ids: &[Uuid],
    ) -> impl Future<Output = FordonResult<()>> + Send;
}
