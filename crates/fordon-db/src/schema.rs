//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Subresource bundles are stored as
//! arrays of nested objects with per-field definitions.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Resource catalog (global scope)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD title ON TABLE resource TYPE string;
-- Lowercased title, backing the case-insensitive uniqueness invariant
-- and the gate's title lookup.
DEFINE FIELD title_key ON TABLE resource TYPE string;
DEFINE FIELD route ON TABLE resource TYPE string;
DEFINE FIELD icon ON TABLE resource TYPE string;
DEFINE FIELD description ON TABLE resource TYPE string;
DEFINE FIELD position ON TABLE resource TYPE int DEFAULT 0;
DEFINE FIELD is_public ON TABLE resource TYPE bool DEFAULT true;
DEFINE FIELD has_subresources ON TABLE resource TYPE bool DEFAULT false;
DEFINE FIELD subresources ON TABLE resource TYPE array DEFAULT [];
DEFINE FIELD subresources.* ON TABLE resource TYPE object;
DEFINE FIELD subresources.*.title ON TABLE resource TYPE string;
DEFINE FIELD subresources.*.route ON TABLE resource TYPE string;
DEFINE FIELD subresources.*.icon ON TABLE resource TYPE string;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_title_key ON TABLE resource \
    COLUMNS title_key UNIQUE;
DEFINE INDEX idx_resource_route ON TABLE resource COLUMNS route UNIQUE;
DEFINE INDEX idx_resource_icon ON TABLE resource COLUMNS icon UNIQUE;

-- =======================================================================
-- Corporations (tenants)
-- =======================================================================
DEFINE TABLE corporation SCHEMAFULL;
DEFINE FIELD name ON TABLE corporation TYPE string;
DEFINE FIELD active ON TABLE corporation TYPE bool DEFAULT true;
DEFINE FIELD allowed_resources ON TABLE corporation TYPE array \
    DEFAULT [];
DEFINE FIELD allowed_resources.* ON TABLE corporation TYPE string;
DEFINE FIELD metadata ON TABLE corporation TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE corporation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE corporation TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Roles (corporation scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD corporation_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD is_system ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_corp_name ON TABLE role \
    COLUMNS corporation_id, name UNIQUE;
DEFINE INDEX idx_role_corp ON TABLE role COLUMNS corporation_id;

-- =======================================================================
-- Permission matrix (one row per role x resource)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD role_id ON TABLE permission TYPE string;
DEFINE FIELD resource_id ON TABLE permission TYPE string;
DEFINE FIELD can_read ON TABLE permission TYPE bool DEFAULT false;
DEFINE FIELD can_create ON TABLE permission TYPE bool DEFAULT false;
DEFINE FIELD can_update ON TABLE permission TYPE bool DEFAULT false;
DEFINE FIELD can_delete ON TABLE permission TYPE bool DEFAULT false;
DEFINE FIELD subresource_permissions ON TABLE permission TYPE array \
    DEFAULT [];
DEFINE FIELD subresource_permissions.* ON TABLE permission TYPE object;
DEFINE FIELD subresource_permissions.*.route ON TABLE permission \
    TYPE string;
DEFINE FIELD subresource_permissions.*.can_read ON TABLE permission \
    TYPE bool DEFAULT false;
DEFINE FIELD subresource_permissions.*.can_create ON TABLE permission \
    TYPE bool DEFAULT false;
DEFINE FIELD subresource_permissions.*.can_update ON TABLE permission \
    TYPE bool DEFAULT false;
DEFINE FIELD subresource_permissions.*.can_delete ON TABLE permission \
    TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_role_resource ON TABLE permission \
    COLUMNS role_id, resource_id UNIQUE;
DEFINE INDEX idx_permission_role ON TABLE permission COLUMNS role_id;
DEFINE INDEX idx_permission_resource ON TABLE permission \
    COLUMNS resource_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_v1_defines_all_core_tables() {
        for table in ["resource", "corporation", "role", "permission"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table definition: {table}"
            );
        }
    }
}
