//! Best-effort analytics port.
//!
//! Tracking is a fire-and-forget side effect invoked after the main
//! transaction commits. It never participates in the transaction and
//! its failure never rolls back or fails the data write — the
//! orchestrator logs and discards errors.

use uuid::Uuid;

use crate::error::NexusResult;
use crate::models::integration::{IntegrationStatus, Platform};

/// An analytics event describing an Integration state change.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub tenant_id: Uuid,
    /// Event name, e.g. `integration-created`.
    pub name: String,
    pub platform: Platform,
    pub integration_id: Uuid,
    pub status: IntegrationStatus,
}

pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: TrackEvent) -> impl Future<Output = NexusResult<()>> + Send;
}

/// Sink that drops every event. Useful when no tracking collaborator
/// is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardAnalytics;

impl AnalyticsSink for DiscardAnalytics {
    async fn track(&self, _event: TrackEvent) -> NexusResult<()> {
        Ok(())
    }
}
