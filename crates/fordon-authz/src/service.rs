//! RBAC service — corporation onboarding, entitlement reconciliation,
//! role administration, permission matrix, and the authorization gate.
//!
//! Generic over repository implementations so that the authorization
//! layer has no dependency on the database crate.

use std::collections::{HashMap, HashSet};

use fordon_core::error::FordonResult;
use fordon_core::models::corporation::{Corporation, CreateCorporation};
use fordon_core::models::permission::{
    Action, CreatePermission, CrudFlags, Permission, PermissionSeed, SubresourcePermission,
};
use fordon_core::models::principal::Principal;
use fordon_core::models::resource::Resource;
use fordon_core::models::role::{CreateRole, Role, UpdateRole};
use fordon_core::repository::{
    CorporationRepository, PaginatedResult, Pagination, PermissionPrune, PermissionRepository,
    ResourceRepository, RoleRepository,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::RbacConfig;
use crate::error::AuthzError;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input for corporation onboarding.
#[derive(Debug)]
pub struct OnboardCorporation {
    pub name: String,
    /// Catalog resource ids the corporation is entitled to.
    pub allowed_resources: Vec<Uuid>,
    pub metadata: Option<serde_json::Value>,
    /// Override for the system role name; defaults to the configured
    /// name ("Admin"). The root tenant passes the configured
    /// root name ("Super Admin").
    pub system_role_name: Option<String>,
}

/// Result of corporation onboarding.
#[derive(Debug)]
pub struct OnboardOutput {
    pub corporation: Corporation,
    pub admin_role: Role,
}

/// One entry of a bulk permission replacement: the desired flags for a
/// single resource, plus per-subresource flags keyed by route. Routes
/// not supplied default to all-false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionInput {
    pub resource_id: Uuid,
    pub flags: CrudFlags,
    pub subresources: Vec<SubresourceInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubresourceInput {
    pub route: String,
    pub flags: CrudFlags,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// A resolved permission entry enriched with resource metadata, ready
/// for direct display. Listings are ordered by resource position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub resource_id: Uuid,
    pub title: String,
    pub route: String,
    pub icon: String,
    pub description: String,
    pub position: i64,
    pub has_subresources: bool,
    pub permissions: CrudFlags,
    pub subresources: Vec<SubresourceGrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubresourceGrant {
    pub title: String,
    pub route: String,
    pub icon: String,
    pub permissions: CrudFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// What a principal may do, filtered to their corporation's current
/// entitlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivePermissions {
    pub role: RoleSummary,
    pub resources: Vec<ResourceGrant>,
}

// ---------------------------------------------------------------------------
// Gate decision
// ---------------------------------------------------------------------------

/// Outcome of the authorization gate. The gate never surfaces errors to
/// business logic; every failure mode collapses into a denial.
#[derive(Debug)]
pub enum Decision {
    /// Continue to the downstream handler. Carries the resolved
    /// permission row for subresource-level checks.
    Allowed(Permission),
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

/// A denied decision: a stable, resource-agnostic message for the
/// caller, and the specific cause for logging only.
#[derive(Debug)]
pub struct Denial {
    pub message: String,
    pub cause: DenyCause,
}

#[derive(Debug)]
pub enum DenyCause {
    /// The requested title matched no catalog resource. Deliberately
    /// not surfaced to the caller, to avoid leaking catalog structure.
    UnknownResource(String),
    /// No permission row exists for (role, resource).
    MissingPermission { role_id: Uuid, resource_id: Uuid },
    /// A row exists but the requested action flag is false.
    ActionDenied {
        role_id: Uuid,
        resource_id: Uuid,
        action: Action,
    },
    /// The permission read itself failed.
    Internal(String),
}

fn denied(action: Action, cause: DenyCause) -> Decision {
    debug!(?cause, %action, "authorization denied");
    Decision::Denied(Denial {
        message: format!("you don't have permission to {action} this resource"),
        cause,
    })
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The RBAC service.
pub struct RbacService<R, C, O, P>
where
    R: ResourceRepository,
    C: CorporationRepository,
    O: RoleRepository,
    P: PermissionRepository,
{
    resources: R,
    corporations: C,
    roles: O,
    permissions: P,
    config: RbacConfig,
}

impl<R, C, O, P> RbacService<R, C, O, P>
where
    R: ResourceRepository,
    C: CorporationRepository,
    O: RoleRepository,
    P: PermissionRepository,
{
    pub fn new(resources: R, corporations: C, roles: O, permissions: P, config: RbacConfig) -> Self {
        Self {
            resources,
            corporations,
            roles,
            permissions,
            config,
        }
    }

    // -- corporation entitlement -------------------------------------------

    /// Onboard a corporation: validate the entitlement set, then create
    /// the corporation, its system Admin role, and one all-true
    /// permission row per entitled resource, all in one transaction.
    pub async fn onboard_corporation(
        &self,
        input: OnboardCorporation,
    ) -> FordonResult<OnboardOutput> {
        let resources = self.resolve_resources(&input.allowed_resources, true).await?;
        let role_name = self.config.system_role_name.clone();
        self.onboard_with(input, resources, role_name).await
    }

    /// Onboard the root tenant. Its system role defaults to the
    /// configured root name ("Super Admin") and its entitlement may
    /// include reserved (non-public) resources, which regular
    /// onboarding rejects.
    pub async fn onboard_root_corporation(
        &self,
        input: OnboardCorporation,
    ) -> FordonResult<OnboardOutput> {
        let resources = self
            .resolve_resources(&input.allowed_resources, false)
            .await?;
        let role_name = self.config.root_system_role_name.clone();
        self.onboard_with(input, resources, role_name).await
    }

    async fn onboard_with(
        &self,
        input: OnboardCorporation,
        resources: Vec<Resource>,
        default_role_name: String,
    ) -> FordonResult<OnboardOutput> {
        let seeds = seed_rows(&resources, CrudFlags::all_true());
        let role_name = input.system_role_name.unwrap_or(default_role_name);

        let (corporation, admin_role) = self
            .corporations
            .onboard(
                CreateCorporation {
                    name: input.name,
                    allowed_resources: input.allowed_resources,
                    metadata: input.metadata,
                },
                role_name,
                self.config.system_role_description.clone(),
                seeds,
            )
            .await?;

        Ok(OnboardOutput {
            corporation,
            admin_role,
        })
    }

    /// Replace a corporation's entitlement set and reconcile the
    /// permission rows of every role it owns: rows are created for
    /// newly entitled resources (all-true for the system role,
    /// all-false otherwise) and hard-deleted for de-entitled ones.
    /// The whole reconciliation commits as one transaction.
    pub async fn update_entitlement(
        &self,
        corporation_id: Uuid,
        new_allowed: Vec<Uuid>,
    ) -> FordonResult<Corporation> {
        let corporation = self.corporations.get_by_id(corporation_id).await?;
        let resources = self.resolve_resources(&new_allowed, false).await?;

        // Reserved resources can be kept (the root tenant holds them
        // from onboarding) but never newly granted here.
        let held: HashSet<Uuid> = corporation.allowed_resources.iter().copied().collect();
        if let Some(reserved) = resources
            .iter()
            .find(|r| !r.is_public && !held.contains(&r.id))
        {
            return Err(AuthzError::NotGrantable {
                title: reserved.title.clone(),
            }
            .into());
        }

        let new_set: HashSet<Uuid> = new_allowed.iter().copied().collect();

        let roles = self.roles.list_all(corporation_id).await?;
        let mut additions: Vec<CreatePermission> = Vec::new();
        let mut prunes: Vec<PermissionPrune> = Vec::new();

        for role in &roles {
            let existing = self.permissions.list_by_role(role.id).await?;
            let existing_ids: HashSet<Uuid> = existing.iter().map(|p| p.resource_id).collect();
            let default_flags = if role.is_system {
                CrudFlags::all_true()
            } else {
                CrudFlags::all_false()
            };

            for resource in &resources {
                if !existing_ids.contains(&resource.id) {
                    additions.push(seed_row(resource, default_flags).into_create(role.id));
                }
            }

            let stale: Vec<Uuid> = existing_ids.difference(&new_set).copied().collect();
            if !stale.is_empty() {
                prunes.push(PermissionPrune {
                    role_id: role.id,
                    resource_ids: stale,
                });
            }
        }

        self.corporations
            .replace_entitlement(corporation_id, new_allowed, additions, prunes)
            .await
    }

    /// Fails with Forbidden when any of the given resources lies
    /// outside the corporation's current entitlement. Guards against
    /// cross-tenant resource assignment.
    pub async fn assert_entitled(
        &self,
        corporation_id: Uuid,
        resource_ids: &[Uuid],
    ) -> FordonResult<()> {
        let corporation = self.corporations.get_by_id(corporation_id).await?;
        let allowed: HashSet<Uuid> = corporation.allowed_resources.iter().copied().collect();
        let outside: Vec<Uuid> = resource_ids
            .iter()
            .filter(|id| !allowed.contains(id))
            .copied()
            .collect();

        if outside.is_empty() {
            Ok(())
        } else {
            Err(AuthzError::NotEntitled {
                corporation_id,
                resource_ids: outside,
            }
            .into())
        }
    }

    /// Delete a corporation together with its roles and permissions.
    pub async fn delete_corporation(&self, corporation_id: Uuid) -> FordonResult<()> {
        self.corporations.get_by_id(corporation_id).await?;
        self.corporations.delete(corporation_id).await
    }

    // -- role administration -----------------------------------------------

    /// Idempotently provision the corporation's system role: returns
    /// the existing one when present, otherwise creates it with
    /// all-true permission rows for the current entitlement.
    pub async fn create_system_admin_role(
        &self,
        corporation_id: Uuid,
        display_name: &str,
    ) -> FordonResult<Role> {
        if let Some(existing) = self.roles.find_system_role(corporation_id).await? {
            return Ok(existing);
        }

        let corporation = self.corporations.get_by_id(corporation_id).await?;
        let resources = self
            .resources
            .list_by_ids(&corporation.allowed_resources)
            .await?;
        let seeds = seed_rows(&resources, CrudFlags::all_true());

        self.roles
            .create(
                CreateRole {
                    corporation_id,
                    name: display_name.to_string(),
                    description: self.config.system_role_description.clone(),
                    is_system: true,
                },
                seeds,
            )
            .await
    }

    /// Create a custom role and provision one all-false permission row
    /// per resource in the corporation's current entitlement.
    pub async fn create_custom_role(
        &self,
        corporation_id: Uuid,
        name: String,
        description: String,
    ) -> FordonResult<Role> {
        let corporation = self.corporations.get_by_id(corporation_id).await?;
        let resources = self
            .resources
            .list_by_ids(&corporation.allowed_resources)
            .await?;
        let seeds = seed_rows(&resources, CrudFlags::all_false());

        self.roles
            .create(
                CreateRole {
                    corporation_id,
                    name,
                    description,
                    is_system: false,
                },
                seeds,
            )
            .await
    }

    pub async fn update_role(
        &self,
        corporation_id: Uuid,
        role_id: Uuid,
        input: UpdateRole,
    ) -> FordonResult<Role> {
        let role = self.roles.get_by_id(corporation_id, role_id).await?;
        if role.is_system {
            return Err(AuthzError::SystemRoleImmutable.into());
        }
        self.roles.update(corporation_id, role_id, input).await
    }

    /// Delete a custom role and its permission rows together.
    pub async fn delete_role(&self, corporation_id: Uuid, role_id: Uuid) -> FordonResult<()> {
        let role = self.roles.get_by_id(corporation_id, role_id).await?;
        if role.is_system {
            return Err(AuthzError::SystemRoleUndeletable.into());
        }
        self.roles.delete(corporation_id, role_id).await
    }

    pub async fn list_roles(
        &self,
        corporation_id: Uuid,
        pagination: Pagination,
    ) -> FordonResult<PaginatedResult<Role>> {
        self.roles.list(corporation_id, pagination).await
    }

    // -- permission matrix -------------------------------------------------

    /// Create permission rows where absent, with subresource entries
    /// derived from each resource's declared subresources and
    /// initialized to `default_flags`. Existing rows keep their flags.
    pub async fn provision_defaults(
        &self,
        corporation_id: Uuid,
        role_id: Uuid,
        resource_ids: &[Uuid],
        default_flags: CrudFlags,
    ) -> FordonResult<()> {
        let role = self.roles.get_by_id(corporation_id, role_id).await?;
        let resources = self.resources.list_by_ids(resource_ids).await?;
        let inputs = resources
            .iter()
            .map(|resource| seed_row(resource, default_flags).into_create(role.id))
            .collect();

        self.permissions.create_many_if_absent(inputs).await
    }

    /// Deny-by-default check of one CRUD flag: true iff a permission
    /// row exists for (role, resource) and the flag is set.
    pub async fn check(
        &self,
        role_id: Uuid,
        resource_id: Uuid,
        action: Action,
    ) -> FordonResult<bool> {
        Ok(self
            .permissions
            .get(role_id, resource_id)
            .await?
            .map(|p| p.flags.allows(action))
            .unwrap_or(false))
    }

    /// Deny-by-default check of one subresource flag. A route with no
    /// matching entry is all-false. Independent of the parent
    /// resource's top-level flags.
    pub async fn check_subresource(
        &self,
        role_id: Uuid,
        resource_id: Uuid,
        subresource_route: &str,
        action: Action,
    ) -> FordonResult<bool> {
        Ok(self
            .permissions
            .get(role_id, resource_id)
            .await?
            .and_then(|p| {
                p.subresource_permissions
                    .into_iter()
                    .find(|s| s.route == subresource_route)
            })
            .map(|s| s.flags.allows(action))
            .unwrap_or(false))
    }

    /// Replace a role's permission set wholesale.
    ///
    /// Each entry upserts the (role, resource) row; per-subresource
    /// flags are joined against the resource's currently declared
    /// routes, with unsupplied routes defaulting to all-false. Fails
    /// with Forbidden for system roles and for resources outside the
    /// corporation's entitlement. Returns the resolved grant list,
    /// ordered by resource position.
    pub async fn bulk_replace(
        &self,
        corporation_id: Uuid,
        role_id: Uuid,
        inputs: Vec<PermissionInput>,
    ) -> FordonResult<Vec<ResourceGrant>> {
        let role = self.roles.get_by_id(corporation_id, role_id).await?;
        if role.is_system {
            return Err(AuthzError::SystemRoleImmutable.into());
        }

        let requested: Vec<Uuid> = inputs.iter().map(|i| i.resource_id).collect();
        self.assert_entitled(corporation_id, &requested).await?;

        let resources = self.resources.list_by_ids(&requested).await?;
        let found: HashSet<Uuid> = resources.iter().map(|r| r.id).collect();
        let missing: Vec<Uuid> = requested
            .iter()
            .filter(|id| !found.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(AuthzError::UnknownResources {
                resource_ids: missing,
            }
            .into());
        }

        let by_resource: HashMap<Uuid, &PermissionInput> =
            inputs.iter().map(|i| (i.resource_id, i)).collect();

        let mut upserts = Vec::with_capacity(resources.len());
        let mut grants = Vec::with_capacity(resources.len());
        for resource in &resources {
            let input = by_resource[&resource.id];
            let supplied: HashMap<&str, CrudFlags> = input
                .subresources
                .iter()
                .map(|s| (s.route.as_str(), s.flags))
                .collect();
            let subresource_permissions: Vec<SubresourcePermission> = resource
                .subresources
                .iter()
                .map(|declared| SubresourcePermission {
                    route: declared.route.clone(),
                    flags: supplied
                        .get(declared.route.as_str())
                        .copied()
                        .unwrap_or_else(CrudFlags::all_false),
                })
                .collect();

            grants.push(resource_grant(
                resource,
                input.flags,
                &subresource_permissions,
            ));
            upserts.push(CreatePermission {
                role_id,
                resource_id: resource.id,
                flags: input.flags,
                subresource_permissions,
            });
        }

        self.permissions.upsert_many(upserts).await?;

        Ok(grants)
    }

    // -- gate and self-query -----------------------------------------------

    /// The per-request authorization gate.
    ///
    /// Resolves the resource by case-insensitive title, then tests the
    /// requested flag on the principal's permission row. Unknown
    /// resources, missing rows, unset flags, and internal read errors
    /// all collapse into the same generic denial; the specific cause is
    /// retained on the decision for logging. Corporation entitlement is
    /// not re-checked here: permission rows only ever exist for
    /// entitled resources.
    pub async fn authorize(
        &self,
        principal: &Principal,
        resource_title: &str,
        action: Action,
    ) -> Decision {
        let resource = match self.resources.find_by_title(resource_title).await {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                return denied(action, DenyCause::UnknownResource(resource_title.to_string()));
            }
            Err(e) => return denied(action, DenyCause::Internal(e.to_string())),
        };

        match self.permissions.get(principal.role_id, resource.id).await {
            Ok(Some(permission)) if permission.flags.allows(action) => {
                Decision::Allowed(permission)
            }
            Ok(Some(_)) => denied(
                action,
                DenyCause::ActionDenied {
                    role_id: principal.role_id,
                    resource_id: resource.id,
                    action,
                },
            ),
            Ok(None) => denied(
                action,
                DenyCause::MissingPermission {
                    role_id: principal.role_id,
                    resource_id: resource.id,
                },
            ),
            Err(e) => denied(action, DenyCause::Internal(e.to_string())),
        }
    }

    /// What the principal's role may do, filtered to resources within
    /// the corporation's current entitlement and ordered by position.
    pub async fn effective_permissions(
        &self,
        principal: &Principal,
    ) -> FordonResult<EffectivePermissions> {
        let role = self
            .roles
            .get_by_id(principal.corporation_id, principal.role_id)
            .await?;
        let corporation = self
            .corporations
            .get_by_id(principal.corporation_id)
            .await?;
        let resources = self
            .resources
            .list_by_ids(&corporation.allowed_resources)
            .await?;
        let rows = self.permissions.list_by_role(role.id).await?;
        let by_resource: HashMap<Uuid, &Permission> =
            rows.iter().map(|p| (p.resource_id, p)).collect();

        let grants = resources
            .iter()
            .map(|resource| match by_resource.get(&resource.id) {
                Some(permission) => resource_grant(
                    resource,
                    permission.flags,
                    &permission.subresource_permissions,
                ),
                None => resource_grant(resource, CrudFlags::all_false(), &[]),
            })
            .collect();

        Ok(EffectivePermissions {
            role: RoleSummary {
                id: role.id,
                name: role.name,
                description: role.description,
            },
            resources: grants,
        })
    }

    // -- internals ---------------------------------------------------------

    /// Validate that every id names an existing catalog resource, and
    /// (unless the caller is root onboarding) that all of them are
    /// grantable (public). Returns the resources ordered by position.
    async fn resolve_resources(
        &self,
        ids: &[Uuid],
        grantable_only: bool,
    ) -> FordonResult<Vec<Resource>> {
        let resources = self.resources.list_by_ids(ids).await?;
        let found: HashSet<Uuid> = resources.iter().map(|r| r.id).collect();
        let missing: Vec<Uuid> = ids.iter().filter(|id| !found.contains(id)).copied().collect();
        if !missing.is_empty() {
            return Err(AuthzError::UnknownResources {
                resource_ids: missing,
            }
            .into());
        }

        if grantable_only {
            if let Some(reserved) = resources.iter().find(|r| !r.is_public) {
                return Err(AuthzError::NotGrantable {
                    title: reserved.title.clone(),
                }
                .into());
            }
        }

        Ok(resources)
    }
}

/// One provisioning seed for a resource: the given flags on the
/// resource and on each of its declared subresources.
fn seed_row(resource: &Resource, flags: CrudFlags) -> PermissionSeed {
    PermissionSeed {
        resource_id: resource.id,
        flags,
        subresource_permissions: resource
            .subresources
            .iter()
            .map(|s| SubresourcePermission {
                route: s.route.clone(),
                flags,
            })
            .collect(),
    }
}

fn seed_rows(resources: &[Resource], flags: CrudFlags) -> Vec<PermissionSeed> {
    resources.iter().map(|r| seed_row(r, flags)).collect()
}

/// Join stored subresource flags against the resource's declared
/// subresources; declared routes without a stored entry are all-false.
fn resource_grant(
    resource: &Resource,
    flags: CrudFlags,
    subresource_permissions: &[SubresourcePermission],
) -> ResourceGrant {
    let stored: HashMap<&str, CrudFlags> = subresource_permissions
        .iter()
        .map(|s| (s.route.as_str(), s.flags))
        .collect();

    ResourceGrant {
        resource_id: resource.id,
        title: resource.title.clone(),
        route: resource.route.clone(),
        icon: resource.icon.clone(),
        description: resource.description.clone(),
        position: resource.position,
        has_subresources: resource.has_subresources,
        permissions: flags,
        subresources: resource
            .subresources
            .iter()
            .map(|declared| SubresourceGrant {
                title: declared.title.clone(),
                route: declared.route.clone(),
                icon: declared.icon.clone(),
                permissions: stored
                    .get(declared.route.as_str())
                    .copied()
                    .unwrap_or_else(CrudFlags::all_false),
            })
            .collect(),
    }
}
