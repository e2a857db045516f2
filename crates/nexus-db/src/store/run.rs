//! SurrealDB implementation of [`RunLedger`].

use chrono::Utc;
use nexus_core::error::NexusResult;
use nexus_core::models::run::{CreateRun, Run, RunState};
use nexus_core::store::RunLedger;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::{DbError, classify_write_error};
use crate::transaction::SurrealTx;

/// SurrealDB implementation of the Run ledger.
///
/// Runs are only ever created here, always in `pending` state —
/// later transitions belong to the run-processing worker.
#[derive(Clone)]
pub struct SurrealRunLedger<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRunLedger<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn execute(
        &self,
        statement: String,
        bindings: Vec<(String, serde_json::Value)>,
    ) -> Result<(), DbError> {
        let mut query = self.db.query(statement);
        for (name, value) in bindings {
            query = query.bind((name, value));
        }
        let result = query.await.map_err(|e| classify_write_error(e, "run"))?;
        result.check().map_err(|e| classify_write_error(e, "run"))?;
        Ok(())
    }
}

impl<C: Connection> RunLedger for SurrealRunLedger<C> {
    type Tx = SurrealTx<C>;

    async fn create(&self, input: CreateRun, tx: Option<&mut SurrealTx<C>>) -> NexusResult<Run> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let n = tx.as_ref().map_or(0, |t| t.statement_index());

        let statement = format!(
            "CREATE type::record('run', $id_{n}) SET \
             integration_id = $integration_id_{n}, \
             tenant_id = $tenant_id_{n}, \
             onboarding = $onboarding_{n}, \
             state = $state_{n}, \
             created_at = type::datetime($created_at_{n})"
        );
        let binds = vec![
            (format!("id_{n}"), serde_json::json!(id.to_string())),
            (
                format!("integration_id_{n}"),
                serde_json::json!(input.integration_id.to_string()),
            ),
            (
                format!("tenant_id_{n}"),
                serde_json::json!(input.tenant_id.to_string()),
            ),
            (format!("onboarding_{n}"), serde_json::json!(input.onboarding)),
            (
                format!("state_{n}"),
                serde_json::json!(RunState::Pending.as_str()),
            ),
            (
                format!("created_at_{n}"),
                serde_json::json!(now.to_rfc3339()),
            ),
        ];

        match tx {
            Some(tx) => tx.push(statement, binds),
            None => self.execute(statement, binds).await?,
        }

        Ok(Run {
            id,
            integration_id: input.integration_id,
            tenant_id: input.tenant_id,
            onboarding: input.onboarding,
            state: RunState::Pending,
            created_at: now,
        })
    }
}
