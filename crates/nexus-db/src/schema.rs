//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The `(tenant_id, platform)`
//! uniqueness invariant on integrations is a UNIQUE index — mutual
//! exclusion between racing onboarding calls is delegated entirely to
//! the database.

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
// Schema v1 — integration and run tables
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Integrations (tenant scope; one per tenant+platform)
-- =======================================================================
DEFINE TABLE integration SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE integration TYPE string;
DEFINE FIELD platform ON TABLE integration TYPE string \
    ASSERT $value IN ['github', 'discord', 'linkedin', 'reddit', \
    'slack', 'twitter', 'stackoverflow', 'discourse', 'hackernews', \
    'devto', 'git'];
DEFINE FIELD status ON TABLE integration TYPE string \
    ASSERT $value IN ['waiting-approval', 'pending-action', \
    'in-progress', 'done', 'error'];
DEFINE FIELD token ON TABLE integration TYPE option<string>;
DEFINE FIELD refresh_token ON TABLE integration TYPE option<string>;
DEFINE FIELD integration_identifier ON TABLE integration \
    TYPE option<string>;
DEFINE FIELD settings ON TABLE integration TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD limit_count ON TABLE integration TYPE int DEFAULT 0;
DEFINE FIELD limit_last_reset_at ON TABLE integration \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE integration TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE integration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_integration_tenant_platform ON TABLE integration \
    COLUMNS tenant_id, platform UNIQUE;

-- =======================================================================
-- Runs (onboarding/refresh attempts; 1 integration : N runs)
-- =======================================================================
DEFINE TABLE run SCHEMAFULL;
DEFINE FIELD integration_id ON TABLE run TYPE string;
DEFINE FIELD tenant_id ON TABLE run TYPE string;
DEFINE FIELD onboarding ON TABLE run TYPE bool;
DEFINE FIELD state ON TABLE run TYPE string \
    ASSERT $value IN ['pending', 'processing', 'completed', 'failed'];
DEFINE FIELD created_at ON TABLE run TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_run_integration ON TABLE run COLUMNS integration_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
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
            db.query("CREATE _migration SET version = $version, name = $name")
                .bind(("version", migration.version))
                .bind(("name", migration.name))
                .await?
                .check()
                .map_err(|e| {
                    DbError::Migration(format!(
                        "Recording migration v{} failed: {}",
                        migration.version, e,
                    ))
                })?;
        }
    }

    Ok(())
}
