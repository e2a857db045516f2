//! Connection bootstrap for the SurrealDB backend.
//!
//! [`DbManager::connect`] authenticates, selects the namespace and
//! database, and applies pending migrations, so a manager you hold is
//! always schema-ready. Settings come from `NEXUS_DB_*` environment
//! variables via [`DbConfig::from_env`], with local-dev defaults.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Connection settings for the SurrealDB backend.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, host:port.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Build the configuration from `NEXUS_DB_URL`,
    /// `NEXUS_DB_NAMESPACE`, `NEXUS_DB_DATABASE`, `NEXUS_DB_USERNAME`
    /// and `NEXUS_DB_PASSWORD`. Unset variables fall back to the
    /// local-dev defaults.
    pub fn from_env() -> Self {
        Self {
            url: env_or("NEXUS_DB_URL", "127.0.0.1:8000"),
            namespace: env_or("NEXUS_DB_NAMESPACE", "nexus"),
            database: env_or("NEXUS_DB_DATABASE", "main"),
            username: env_or("NEXUS_DB_USERNAME", "root"),
            password: env_or("NEXUS_DB_PASSWORD", "root"),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "nexus".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Handle to a connected, migrated SurrealDB backend.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the WebSocket connection, sign in, select the configured
    /// namespace/database, and bring the schema up to date.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "connecting to database"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;
        info!("database ready, schema is current");

        Ok(Self { db })
    }

    /// The underlying client, for store construction.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
