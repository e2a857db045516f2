//! Buffered atomic transaction handle.
//!
//! The SurrealDB SDK exposes no interactive transaction API, so a
//! [`SurrealTx`] stages write statements and their bindings and, on
//! commit, submits them as one `BEGIN TRANSACTION; ...; COMMIT
//! TRANSACTION;` batch. A failed statement cancels the whole batch,
//! which gives the all-or-nothing guarantee the orchestrator relies
//! on. Rollback simply discards the buffer — nothing has been sent.

use nexus_core::error::NexusResult;
use nexus_core::store::StoreTx;
use surrealdb::{Connection, Surreal};

use crate::error::classify_write_error;

pub struct SurrealTx<C: Connection> {
    db: Surreal<C>,
    statements: Vec<String>,
    bindings: Vec<(String, serde_json::Value)>,
}

impl<C: Connection> SurrealTx<C> {
    pub(crate) fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            statements: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Position of the next staged statement. Stores suffix their
    /// parameter names with this so bindings never collide inside
    /// the batch.
    pub(crate) fn statement_index(&self) -> usize {
        self.statements.len()
    }

    /// Stage a statement (no trailing semicolon) and its bindings.
    pub(crate) fn push(&mut self, statement: String, bindings: Vec<(String, serde_json::Value)>) {
        self.statements.push(statement);
        self.bindings.extend(bindings);
    }
}

impl<C: Connection> StoreTx for SurrealTx<C> {
    async fn commit(self) -> NexusResult<()> {
        if self.statements.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "BEGIN TRANSACTION; {}; COMMIT TRANSACTION;",
            self.statements.join("; ")
        );

        let mut query = self.db.query(sql);
        for (name, value) in self.bindings {
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

    async fn rollback(self) -> NexusResult<()> {
        // Nothing was sent to the database; dropping the buffer is
        // the rollback.
        Ok(())
    }
}
