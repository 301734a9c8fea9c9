//! SurrealDB implementation of [`ResourceRepository`].

use chrono::{DateTime, Utc};
use fordon_core::error::FordonResult;
use fordon_core::models::resource::{CreateResource, Resource, Subresource};
use fordon_core::repository::ResourceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct SubresourceRow {
    title: String,
    route: String,
    icon: String,
}

impl SubresourceRow {
    pub(crate) fn from_model(sub: &Subresource) -> Self {
        Self {
            title: sub.title.clone(),
            route: sub.route.clone(),
            icon: sub.icon.clone(),
        }
    }

    fn into_model(self) -> Subresource {
        Subresource {
            title: self.title,
            route: self.route,
            icon: self.icon,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct ResourceRow {
    title: String,
    route: String,
    icon: String,
    description: String,
    position: i64,
    is_public: bool,
    has_subresources: bool,
    subresources: Vec<SubresourceRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRow {
    fn into_resource(self, id: Uuid) -> Resource {
        Resource {
            id,
            title: self.title,
            route: self.route,
            icon: self.icon,
            description: self.description,
            position: self.position,
            is_public: self.is_public,
            has_subresources: self.has_subresources,
            subresources: self
                .subresources
                .into_iter()
                .map(SubresourceRow::into_model)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct ResourceRowWithId {
    record_id: String,
    title: String,
    route: String,
    icon: String,
    description: String,
    position: i64,
    is_public: bool,
    has_subresources: bool,
    subresources: Vec<SubresourceRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRowWithId {
    fn try_into_resource(self) -> Result<Resource, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Resource {
            id,
            title: self.title,
            route: self.route,
            icon: self.icon,
            description: self.description,
            position: self.position,
            is_public: self.is_public,
            has_subresources: self.has_subresources,
            subresources: self
                .subresources
                .into_iter()
                .map(SubresourceRow::into_model)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, input: CreateResource) -> FordonResult<Resource> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let subresources: Vec<SubresourceRow> = input
            .subresources
            .iter()
            .map(SubresourceRow::from_model)
            .collect();
        let has_subresources = !subresources.is_empty();

        let result = self
            .db
            .query(
                "CREATE type::record('resource', $id) SET \
                 title = $title, \
                 title_key = string::lowercase($title), \
                 route = $route, icon = $icon, \
                 description = $description, position = $position, \
                 is_public = $is_public, \
                 has_subresources = $has_subresources, \
                 subresources = $subresources",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("route", input.route))
            .bind(("icon", input.icon))
            .bind(("description", input.description))
            .bind(("position", input.position))
            .bind(("is_public", input.is_public))
            .bind(("has_subresources", has_subresources))
            .bind(("subresources", subresources))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("resource", e))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        Ok(row.into_resource(id))
    }

    async fn get_by_id(&self, id: Uuid) -> FordonResult<Resource> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('resource', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        Ok(row.into_resource(id))
    }

    async fn find_by_route(&self, route: &str) -> FordonResult<Option<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE route = $route LIMIT 1",
            )
            .bind(("route", route.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_resource()?)),
            None => Ok(None),
        }
    }

    async fn find_by_title(&self, title: &str) -> FordonResult<Option<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE title_key = string::lowercase($title) LIMIT 1",
            )
            .bind(("title", title.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_resource()?)),
            None => Ok(None),
        }
    }

    async fn list_public(&self) -> FordonResult<Vec<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE is_public = true \
                 ORDER BY position ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;

        let resources = rows
            .into_iter()
            .map(|row| row.try_into_resource())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(resources)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> FordonResult<Vec<Resource>> {
        let id_strs: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY position ASC",
            )
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;

        let resources = rows
            .into_iter()
            .map(|row| row.try_into_resource())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(resources)
    }

    async fn update_subresources(
        &self,
        id: Uuid,
        subresources: Vec<Subresource>,
    ) -> FordonResult<Resource> {
        let id_str = id.to_string();
        let rows: Vec<SubresourceRow> =
            subresources.iter().map(SubresourceRow::from_model).collect();
        let has_subresources = !rows.is_empty();

        let result = self
            .db
            .query(
                "UPDATE type::record('resource', $id) SET \
                 subresources = $subresources, \
                 has_subresources = $has_subresources, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("subresources", rows))
            .bind(("has_subresources", has_subresources))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        Ok(row.into_resource(id))
    }
}
