//! SurrealDB implementation of [`IntegrationStore`].

use chrono::{DateTime, Utc};
use nexus_core::error::NexusResult;
use nexus_core::models::integration::{
    CreateIntegration, Integration, IntegrationStatus, Platform, UpdateIntegration,
};
use nexus_core::models::settings::IntegrationSettings;
use nexus_core::store::{IntegrationFilter, IntegrationStore};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify_write_error};
use crate::transaction::SurrealTx;

fn parse_platform(s: &str) -> Result<Platform, DbError> {
    match s {
        "github" => Ok(Platform::Github),
        "discord" => Ok(Platform::Discord),
        "linkedin" => Ok(Platform::Linkedin),
        "reddit" => Ok(Platform::Reddit),
        "slack" => Ok(Platform::Slack),
        "twitter" => Ok(Platform::Twitter),
        "stackoverflow" => Ok(Platform::Stackoverflow),
        "discourse" => Ok(Platform::Discourse),
        "hackernews" => Ok(Platform::Hackernews),
        "devto" => Ok(Platform::Devto),
        "git" => Ok(Platform::Git),
        other => Err(DbError::Decode(format!("unknown platform: {other}"))),
    }
}

fn parse_status(s: &str) -> Result<IntegrationStatus, DbError> {
    match s {
        "waiting-approval" => Ok(IntegrationStatus::WaitingApproval),
        "pending-action" => Ok(IntegrationStatus::PendingAction),
        "in-progress" => Ok(IntegrationStatus::InProgress),
        "done" => Ok(IntegrationStatus::Done),
        "error" => Ok(IntegrationStatus::Error),
        other => Err(DbError::Decode(format!("unknown integration status: {other}"))),
    }
}

/// DB-side row struct; the record ID comes back via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct IntegrationRow {
    record_id: String,
    tenant_id: String,
    platform: String,
    status: String,
    token: Option<String>,
    refresh_token: Option<String>,
    integration_identifier: Option<String>,
    settings: serde_json::Value,
    limit_count: i64,
    limit_last_reset_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IntegrationRow {
    fn try_into_integration(self) -> Result<Integration, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let settings: IntegrationSettings = serde_json::from_value(self.settings)
            .map_err(|e| DbError::Decode(format!("invalid settings document: {e}")))?;
        Ok(Integration {
            id,
            tenant_id,
            platform: parse_platform(&self.platform)?,
            status: parse_status(&self.status)?,
            token: self.token,
            refresh_token: self.refresh_token,
            integration_identifier: self.integration_identifier,
            settings,
            limit_count: self.limit_count,
            limit_last_reset_at: self.limit_last_reset_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Integration store.
#[derive(Clone)]
pub struct SurrealIntegrationStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealIntegrationStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Execute one write statement immediately (no ambient
    /// transaction).
    async fn execute(
        &self,
        statement: String,
        bindings: Vec<(String, serde_json::Value)>,
    ) -> Result<(), DbError> {
        let mut query = self.db.query(statement);
        for (name, value) in bindings {
            query = query.bind((name, value));
        }
        let result = query
            .await
            .map_err(|e| classify_write_error(e, "integration"))?;
        result
            .check()
            .map_err(|e| classify_write_error(e, "integration"))?;
        Ok(())
    }

    /// Stage into the transaction when one is supplied, otherwise
    /// execute immediately.
    async fn apply(
        &self,
        statement: String,
        bindings: Vec<(String, serde_json::Value)>,
        tx: Option<&mut SurrealTx<C>>,
    ) -> Result<(), DbError> {
        match tx {
            Some(tx) => {
                tx.push(statement, bindings);
                Ok(())
            }
            None => self.execute(statement, bindings).await,
        }
    }

    /// Read one Integration by record id, verifying tenant ownership.
    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Integration, DbError> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('integration', $id)",
            )
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<IntegrationRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "integration".into(),
            id: id_str.clone(),
        })?;

        let integration = row.try_into_integration()?;
        if integration.tenant_id != tenant_id {
            return Err(DbError::NotFound {
                entity: "integration".into(),
                id: id_str,
            });
        }
        Ok(integration)
    }
}

impl<C: Connection> IntegrationStore for SurrealIntegrationStore<C> {
    type Tx = SurrealTx<C>;

    async fn begin(&self) -> NexusResult<SurrealTx<C>> {
        Ok(SurrealTx::new(self.db.clone()))
    }

    async fn find_by_platform(
        &self,
        tenant_id: Uuid,
        platform: Platform,
    ) -> NexusResult<Integration> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM integration \
                 WHERE tenant_id = $tenant_id AND platform = $platform",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("platform", platform.as_str()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IntegrationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "integration".into(),
            id: format!("tenant={tenant_id},platform={platform}"),
        })?;

        Ok(row.try_into_integration()?)
    }

    async fn find_all_by_platform(
        &self,
        tenant_id: Uuid,
        platform: Platform,
    ) -> NexusResult<Vec<Integration>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM integration \
                 WHERE tenant_id = $tenant_id AND platform = $platform \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("platform", platform.as_str()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IntegrationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_integration())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn create(
        &self,
        input: CreateIntegration,
        tx: Option<&mut SurrealTx<C>>,
    ) -> NexusResult<Integration> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let settings_value =
            serde_json::to_value(&input.settings).map_err(|e| DbError::Decode(e.to_string()))?;

        // Parameter names are suffixed with the statement position so
        // several staged statements can share one bound query.
        let n = tx.as_ref().map_or(0, |t| t.statement_index());

        let mut sets = vec![
            format!("tenant_id = $tenant_id_{n}"),
            format!("platform = $platform_{n}"),
            format!("status = $status_{n}"),
            format!("settings = $settings_{n}"),
            format!("limit_count = $limit_count_{n}"),
            format!("created_at = type::datetime($created_at_{n})"),
            format!("updated_at = type::datetime($created_at_{n})"),
        ];
        let mut binds = vec![
            (format!("id_{n}"), serde_json::json!(id.to_string())),
            (
                format!("tenant_id_{n}"),
                serde_json::json!(input.tenant_id.to_string()),
            ),
            (
                format!("platform_{n}"),
                serde_json::json!(input.platform.as_str()),
            ),
            (
                format!("status_{n}"),
                serde_json::json!(input.status.as_str()),
            ),
            (format!("settings_{n}"), settings_value),
            (
                format!("limit_count_{n}"),
                serde_json::json!(input.limit_count),
            ),
            (
                format!("created_at_{n}"),
                serde_json::json!(now.to_rfc3339()),
            ),
        ];

        if let Some(ref token) = input.token {
            sets.push(format!("token = $token_{n}"));
            binds.push((format!("token_{n}"), serde_json::json!(token)));
        }
        if let Some(ref refresh_token) = input.refresh_token {
            sets.push(format!("refresh_token = $refresh_token_{n}"));
            binds.push((
                format!("refresh_token_{n}"),
                serde_json::json!(refresh_token),
            ));
        }
        if let Some(ref identifier) = input.integration_identifier {
            sets.push(format!("integration_identifier = $identifier_{n}"));
            binds.push((format!("identifier_{n}"), serde_json::json!(identifier)));
        }
        if let Some(reset_at) = input.limit_last_reset_at {
            sets.push(format!(
                "limit_last_reset_at = type::datetime($limit_reset_{n})"
            ));
            binds.push((
                format!("limit_reset_{n}"),
                serde_json::json!(reset_at.to_rfc3339()),
            ));
        }

        let statement = format!(
            "CREATE type::record('integration', $id_{n}) SET {}",
            sets.join(", ")
        );

        self.apply(statement, binds, tx).await?;

        Ok(Integration {
            id,
            tenant_id: input.tenant_id,
            platform: input.platform,
            status: input.status,
            token: input.token,
            refresh_token: input.refresh_token,
            integration_identifier: input.integration_identifier,
            settings: input.settings,
            limit_count: input.limit_count,
            limit_last_reset_at: input.limit_last_reset_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateIntegration,
        tx: Option<&mut SurrealTx<C>>,
    ) -> NexusResult<Integration> {
        // Read the current row (outside any staged batch), merge the
        // provided fields locally, and persist the merged values so
        // the returned record matches what commit will write.
        let mut merged = self.get_by_id(tenant_id, id).await?;
        let now = Utc::now();

        let n = tx.as_ref().map_or(0, |t| t.statement_index());

        let mut sets = vec![format!("updated_at = type::datetime($updated_at_{n})")];
        let mut binds = vec![
            (format!("id_{n}"), serde_json::json!(id.to_string())),
            (
                format!("updated_at_{n}"),
                serde_json::json!(now.to_rfc3339()),
            ),
        ];

        if let Some(status) = input.status {
            merged.status = status;
            sets.push(format!("status = $status_{n}"));
            binds.push((format!("status_{n}"), serde_json::json!(status.as_str())));
        }
        if let Some(token) = input.token {
            sets.push(format!("token = $token_{n}"));
            binds.push((format!("token_{n}"), serde_json::json!(token)));
            merged.token = Some(token);
        }
        if let Some(refresh_token) = input.refresh_token {
            sets.push(format!("refresh_token = $refresh_token_{n}"));
            binds.push((
                format!("refresh_token_{n}"),
                serde_json::json!(refresh_token),
            ));
            merged.refresh_token = Some(refresh_token);
        }
        if let Some(identifier) = input.integration_identifier {
            sets.push(format!("integration_identifier = $identifier_{n}"));
            binds.push((format!("identifier_{n}"), serde_json::json!(identifier)));
            merged.integration_identifier = Some(identifier);
        }
        if let Some(settings) = input.settings {
            let settings_value =
                serde_json::to_value(&settings).map_err(|e| DbError::Decode(e.to_string()))?;
            sets.push(format!("settings = $settings_{n}"));
            binds.push((format!("settings_{n}"), settings_value));
            merged.settings = settings;
        }
        if let Some(limit_count) = input.limit_count {
            merged.limit_count = limit_count;
            sets.push(format!("limit_count = $limit_count_{n}"));
            binds.push((format!("limit_count_{n}"), serde_json::json!(limit_count)));
        }
        if let Some(reset_at) = input.limit_last_reset_at {
            merged.limit_last_reset_at = Some(reset_at);
            sets.push(format!(
                "limit_last_reset_at = type::datetime($limit_reset_{n})"
            ));
            binds.push((
                format!("limit_reset_{n}"),
                serde_json::json!(reset_at.to_rfc3339()),
            ));
        }

        merged.updated_at = now;

        let statement = format!(
            "UPDATE type::record('integration', $id_{n}) SET {}",
            sets.join(", ")
        );

        self.apply(statement, binds, tx).await?;

        Ok(merged)
    }

    async fn destroy(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        tx: Option<&mut SurrealTx<C>>,
    ) -> NexusResult<()> {
        // DELETE is a no-op on missing records in SurrealDB; the
        // existence check makes deleting an already-deleted id a
        // NotFound failure instead.
        self.get_by_id(tenant_id, id).await?;

        let n = tx.as_ref().map_or(0, |t| t.statement_index());
        let statement = format!("DELETE type::record('integration', $id_{n})");
        let binds = vec![(format!("id_{n}"), serde_json::json!(id.to_string()))];

        self.apply(statement, binds, tx).await?;
        Ok(())
    }

    async fn count(&self, tenant_id: Uuid, filter: IntegrationFilter) -> NexusResult<u64> {
        let mut conditions = vec!["tenant_id = $tenant_id".to_string()];
        if filter.platform.is_some() {
            conditions.push("platform = $platform".into());
        }
        if filter.status.is_some() {
            conditions.push("status = $status".into());
        }

        let query = format!(
            "SELECT count() AS total FROM integration WHERE {} GROUP ALL",
            conditions.join(" AND ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(platform) = filter.platform {
            builder = builder.bind(("platform", platform.as_str()));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
