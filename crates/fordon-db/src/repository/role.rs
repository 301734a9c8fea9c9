//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use fordon_core::error::FordonResult;
use fordon_core::models::permission::{CreatePermission, PermissionSeed};
use fordon_core::models::role::{CreateRole, Role, UpdateRole};
use fordon_core::repository::{PaginatedResult, Pagination, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::permission::{insert_if_absent_sql, permission_bindings};

#[derive(Debug, SurrealValue)]
struct RoleRow {
    corporation_id: String,
    name: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self, id: Uuid) -> Result<Role, DbError> {
        let corporation_id = Uuid::parse_str(&self.corporation_id)
            .map_err(|e| DbError::Query(format!("invalid corporation UUID: {e}")))?;
        Ok(Role {
            id,
            corporation_id,
            name: self.name,
            description: self.description,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    corporation_id: String,
    name: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        RoleRow {
            corporation_id: self.corporation_id,
            name: self.name,
            description: self.description,
            is_system: self.is_system,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_role(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(
        &self,
        input: CreateRole,
        permissions: Vec<PermissionSeed>,
    ) -> FordonResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let corporation_id = input.corporation_id;
        let permissions: Vec<CreatePermission> = permissions
            .into_iter()
            .map(|seed| seed.into_create(id))
            .collect();

        // Role creation and permission provisioning commit together so
        // a role is never observable without its rows.
        let mut query = String::from(
            "BEGIN TRANSACTION;\n\
             CREATE type::record('role', $id) SET \
             corporation_id = $corporation_id, \
             name = $name, description = $description, \
             is_system = $is_system;\n",
        );
        for (i, _) in permissions.iter().enumerate() {
            query.push_str(&insert_if_absent_sql(&format!("p{i}")));
            query.push('\n');
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str))
            .bind(("corporation_id", corporation_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("is_system", input.is_system));
        for (i, permission) in permissions.iter().enumerate() {
            for (name, value) in permission_bindings(&format!("p{i}"), permission) {
                builder = builder.bind((name, value));
            }
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("role", e))?;

        self.get_by_id(corporation_id, id).await
    }

    async fn get_by_id(&self, corporation_id: Uuid, id: Uuid) -> FordonResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE corporation_id = $corporation_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("corporation_id", corporation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role(id)?)
    }

    async fn find_system_role(&self, corporation_id: Uuid) -> FordonResult<Option<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE corporation_id = $corporation_id \
                 AND is_system = true LIMIT 1",
            )
            .bind(("corporation_id", corporation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_role()?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        corporation_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> FordonResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
             WHERE corporation_id = $corporation_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("corporation_id", corporation_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_role(id)?)
    }

    async fn delete(&self, corporation_id: Uuid, id: Uuid) -> FordonResult<()> {
        let id_str = id.to_string();

        // The role's permission rows go with it; callers verify the
        // corporation scope via get_by_id first.
        self.db
            .query(
                "BEGIN TRANSACTION;\n\
                 DELETE permission WHERE role_id = $id;\n\
                 DELETE type::record('role', $id) \
                 WHERE corporation_id = $corporation_id;\n\
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .bind(("corporation_id", corporation_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        corporation_id: Uuid,
        pagination: Pagination,
    ) -> FordonResult<PaginatedResult<Role>> {
        let corporation_id_str = corporation_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE corporation_id = $corporation_id GROUP ALL",
            )
            .bind(("corporation_id", corporation_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE corporation_id = $corporation_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("corporation_id", corporation_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self, corporation_id: Uuid) -> FordonResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE corporation_id = $corporation_id \
                 ORDER BY created_at ASC",
            )
            .bind(("corporation_id", corporation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
