//! SurrealDB implementation of [`CorporationRepository`].
//!
//! Onboarding and entitlement replacement are multi-document mutations;
//! both run as a single transaction so that a corporation is never
//! observable with a missing system role or a half-reconciled
//! permission matrix.

use chrono::{DateTime, Utc};
use fordon_core::error::FordonResult;
use fordon_core::models::corporation::{Corporation, CreateCorporation};
use fordon_core::models::permission::{CreatePermission, PermissionSeed};
use fordon_core::models::role::Role;
use fordon_core::repository::{CorporationRepository, PermissionPrune};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::permission::{insert_if_absent_sql, permission_bindings};

#[derive(Debug, SurrealValue)]
struct CorporationRow {
    name: String,
    active: bool,
    allowed_resources: Vec<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CorporationRow {
    fn try_into_corporation(self, id: Uuid) -> Result<Corporation, DbError> {
        let allowed_resources = self
            .allowed_resources
            .iter()
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|e| DbError::Query(format!("invalid resource UUID: {e}")))
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(Corporation {
            id,
            name: self.name,
            active: self.active,
            allowed_resources,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRow {
    corporation_id: String,
    name: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// SurrealDB implementation of the Corporation repository.
#[derive(Clone)]
pub struct SurrealCorporationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCorporationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CorporationRepository for SurrealCorporationRepository<C> {
    async fn onboard(
        &self,
        corporation: CreateCorporation,
        system_role_name: String,
        system_role_description: String,
        permissions: Vec<PermissionSeed>,
    ) -> FordonResult<(Corporation, Role)> {
        let corp_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();
        let permissions: Vec<CreatePermission> = permissions
            .into_iter()
            .map(|seed| seed.into_create(role_id))
            .collect();
        let allowed: Vec<String> = corporation
            .allowed_resources
            .iter()
            .map(|id| id.to_string())
            .collect();
        let metadata = corporation
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let mut query = String::from(
            "BEGIN TRANSACTION;\n\
             CREATE type::record('corporation', $corp_id) SET \
             name = $corp_name, active = true, \
             allowed_resources = $allowed, metadata = $metadata;\n\
             CREATE type::record('role', $role_id) SET \
             corporation_id = $corp_id, \
             name = $role_name, description = $role_description, \
             is_system = true;\n",
        );
        for (i, _) in permissions.iter().enumerate() {
            query.push_str(&insert_if_absent_sql(&format!("p{i}")));
            query.push('\n');
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("corp_id", corp_id.to_string()))
            .bind(("corp_name", corporation.name))
            .bind(("allowed", allowed))
            .bind(("metadata", metadata))
            .bind(("role_id", role_id.to_string()))
            .bind(("role_name", system_role_name))
            .bind(("role_description", system_role_description));
        for (i, permission) in permissions.iter().enumerate() {
            for (name, value) in permission_bindings(&format!("p{i}"), permission) {
                builder = builder.bind((name, value));
            }
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("corporation", e))?;

        let corp = self.get_by_id(corp_id).await?;

        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: role_id.to_string(),
        })?;
        let corporation_id = Uuid::parse_str(&row.corporation_id)
            .map_err(|e| DbError::Query(format!("invalid corporation UUID: {e}")))?;
        let role = Role {
            id: role_id,
            corporation_id,
            name: row.name,
            description: row.description,
            is_system: row.is_system,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok((corp, role))
    }

    async fn get_by_id(&self, id: Uuid) -> FordonResult<Corporation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('corporation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CorporationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "corporation".into(),
            id: id_str,
        })?;

        Ok(row.try_into_corporation(id)?)
    }

    async fn replace_entitlement(
        &self,
        id: Uuid,
        allowed_resources: Vec<Uuid>,
        additions: Vec<CreatePermission>,
        prunes: Vec<PermissionPrune>,
    ) -> FordonResult<Corporation> {
        let allowed: Vec<String> = allowed_resources.iter().map(|r| r.to_string()).collect();

        let mut query = String::from(
            "BEGIN TRANSACTION;\n\
             UPDATE type::record('corporation', $id) SET \
             allowed_resources = $allowed, updated_at = time::now();\n",
        );
        for (i, _) in additions.iter().enumerate() {
            query.push_str(&insert_if_absent_sql(&format!("p{i}")));
            query.push('\n');
        }
        for (i, _) in prunes.iter().enumerate() {
            query.push_str(&format!(
                "DELETE permission WHERE role_id = $x{i}_role \
                 AND resource_id IN $x{i}_resources;\n"
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("allowed", allowed));
        for (i, permission) in additions.iter().enumerate() {
            for (name, value) in permission_bindings(&format!("p{i}"), permission) {
                builder = builder.bind((name, value));
            }
        }
        for (i, prune) in prunes.iter().enumerate() {
            let resource_strs: Vec<String> =
                prune.resource_ids.iter().map(|r| r.to_string()).collect();
            builder = builder
                .bind((format!("x{i}_role"), prune.role_id.to_string()))
                .bind((format!("x{i}_resources"), resource_strs));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> FordonResult<()> {
        let id_str = id.to_string();

        // Roles and their permission rows cascade with the corporation.
        self.db
            .query(
                "BEGIN TRANSACTION;\n\
                 LET $role_ids = (SELECT VALUE meta::id(id) FROM role \
                 WHERE corporation_id = $id);\n\
                 DELETE permission WHERE role_id IN $role_ids;\n\
                 DELETE role WHERE corporation_id = $id;\n\
                 DELETE type::record('corporation', $id);\n\
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
