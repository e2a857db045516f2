//! Run domain model.
//!
//! A Run records one attempt to execute an integration's onboarding
//! or refresh workload. The orchestrator only ever creates `Pending`
//! runs; all later state transitions are owned by the external
//! run-processing worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Processing => "processing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One onboarding/refresh attempt for an Integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub integration_id: Uuid,
    /// Always equals the owning Integration's tenant — the
    /// orchestrator copies it from the freshly written record.
    pub tenant_id: Uuid,
    /// Distinguishes first-time setup from a refresh trigger.
    pub onboarding: bool,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new Run. State always starts `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRun {
    pub integration_id: Uuid,
    pub tenant_id: Uuid,
    pub onboarding: bool,
}
