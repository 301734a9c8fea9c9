//! SurrealDB implementation of [`PermissionRepository`].
//!
//! Permission records are addressed by an id derived from the
//! (role, resource) pair, so create-if-absent and upsert both operate
//! on a single record per pair. Batch mutations run as one
//! multi-statement transaction.

use chrono::{DateTime, Utc};
use fordon_core::error::FordonResult;
use fordon_core::models::permission::{
    CreatePermission, CrudFlags, Permission, SubresourcePermission, permission_record_id,
};
use fordon_core::repository::PermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::{SurrealValue, Value};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct SubresourceFlagsRow {
    route: String,
    can_read: bool,
    can_create: bool,
    can_update: bool,
    can_delete: bool,
}

impl SubresourceFlagsRow {
    pub(crate) fn from_model(sub: &SubresourcePermission) -> Self {
        Self {
            route: sub.route.clone(),
            can_read: sub.flags.can_read,
            can_create: sub.flags.can_create,
            can_update: sub.flags.can_update,
            can_delete: sub.flags.can_delete,
        }
    }

    fn into_model(self) -> SubresourcePermission {
        SubresourcePermission {
            route: self.route,
            flags: CrudFlags {
                can_read: self.can_read,
                can_create: self.can_create,
                can_update: self.can_update,
                can_delete: self.can_delete,
            },
        }
    }
}

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    role_id: String,
    resource_id: String,
    can_read: bool,
    can_create: bool,
    can_update: bool,
    can_delete: bool,
    subresource_permissions: Vec<SubresourceFlagsRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn try_into_permission(self, id: Uuid) -> Result<Permission, DbError> {
        let role_id = Uuid::parse_str(&self.role_id)
            .map_err(|e| DbError::Query(format!("invalid role UUID: {e}")))?;
        let resource_id = Uuid::parse_str(&self.resource_id)
            .map_err(|e| DbError::Query(format!("invalid resource UUID: {e}")))?;
        Ok(Permission {
            id,
            role_id,
            resource_id,
            flags: CrudFlags {
                can_read: self.can_read,
                can_create: self.can_create,
                can_update: self.can_update,
                can_delete: self.can_delete,
            },
            subresource_permissions: self
                .subresource_permissions
                .into_iter()
                .map(SubresourceFlagsRow::into_model)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    role_id: String,
    resource_id: String,
    can_read: bool,
    can_create: bool,
    can_update: bool,
    can_delete: bool,
    subresource_permissions: Vec<SubresourceFlagsRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        PermissionRow {
            role_id: self.role_id,
            resource_id: self.resource_id,
            can_read: self.can_read,
            can_create: self.can_create,
            can_update: self.can_update,
            can_delete: self.can_delete,
            subresource_permissions: self.subresource_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_permission(id)
    }
}

/// Statement creating one permission row unless its record already
/// exists. Bind names are prefixed so several statements can share one
/// query.
pub(crate) fn insert_if_absent_sql(prefix: &str) -> String {
    format!(
        "INSERT IGNORE INTO permission {{ \
         id: type::record('permission', ${prefix}_id), \
         role_id: ${prefix}_role, resource_id: ${prefix}_resource, \
         can_read: ${prefix}_can_read, can_create: ${prefix}_can_create, \
         can_update: ${prefix}_can_update, can_delete: ${prefix}_can_delete, \
         subresource_permissions: ${prefix}_subs }};"
    )
}

/// Statement creating or replacing one permission row.
fn upsert_sql(prefix: &str) -> String {
    format!(
        "UPSERT type::record('permission', ${prefix}_id) SET \
         role_id = ${prefix}_role, resource_id = ${prefix}_resource, \
         can_read = ${prefix}_can_read, can_create = ${prefix}_can_create, \
         can_update = ${prefix}_can_update, can_delete = ${prefix}_can_delete, \
         subresource_permissions = ${prefix}_subs, \
         updated_at = time::now();"
    )
}

/// Bindings for one permission statement under the given prefix.
pub(crate) fn permission_bindings(prefix: &str, input: &CreatePermission) -> Vec<(String, Value)> {
    let record_id = permission_record_id(input.role_id, input.resource_id);
    let subs: Vec<SubresourceFlagsRow> = input
        .subresource_permissions
        .iter()
        .map(SubresourceFlagsRow::from_model)
        .collect();

    vec![
        (format!("{prefix}_id"), record_id.to_string().into_value()),
        (
            format!("{prefix}_role"),
            input.role_id.to_string().into_value(),
        ),
        (
            format!("{prefix}_resource"),
            input.resource_id.to_string().into_value(),
        ),
        (
            format!("{prefix}_can_read"),
            input.flags.can_read.into_value(),
        ),
        (
            format!("{prefix}_can_create"),
            input.flags.can_create.into_value(),
        ),
        (
            format!("{prefix}_can_update"),
            input.flags.can_update.into_value(),
        ),
        (
            format!("{prefix}_can_delete"),
            input.flags.can_delete.into_value(),
        ),
        (format!("{prefix}_subs"), subs.into_value()),
    ]
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn run_batch(
        &self,
        inputs: Vec<CreatePermission>,
        statement: fn(&str) -> String,
    ) -> FordonResult<()> {
        if inputs.is_empty() {
            return Ok(());
        }

        let mut query = String::from("BEGIN TRANSACTION;\n");
        for (i, _) in inputs.iter().enumerate() {
            query.push_str(&statement(&format!("p{i}")));
            query.push('\n');
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self.db.query(query);
        for (i, input) in inputs.iter().enumerate() {
            for (name, value) in permission_bindings(&format!("p{i}"), input) {
                builder = builder.bind((name, value));
            }
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create_many_if_absent(&self, inputs: Vec<CreatePermission>) -> FordonResult<()> {
        self.run_batch(inputs, insert_if_absent_sql).await
    }

    async fn upsert_many(&self, inputs: Vec<CreatePermission>) -> FordonResult<()> {
        self.run_batch(inputs, upsert_sql).await
    }

    async fn get(&self, role_id: Uuid, resource_id: Uuid) -> FordonResult<Option<Permission>> {
        let id = permission_record_id(role_id, resource_id);

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_permission(id)?)),
            None => Ok(None),
        }
    }

    async fn list_by_role(&self, role_id: Uuid) -> FordonResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE role_id = $role_id",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        let permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn delete_for_resources(
        &self,
        role_id: Uuid,
        resource_ids: &[Uuid],
    ) -> FordonResult<()> {
        if resource_ids.is_empty() {
            return Ok(());
        }

        let id_strs: Vec<String> = resource_ids.iter().map(|id| id.to_string()).collect();

        self.db
            .query(
                "DELETE permission WHERE role_id = $role_id \
                 AND resource_id IN $resource_ids",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("resource_ids", id_strs))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
