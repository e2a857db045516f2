//! Dispatch port — how the orchestrator notifies asynchronous
//! run-processing workers.
//!
//! Two mechanisms exist: a point-to-point work-queue send keyed by a
//! Run id, and a trigger-emitter call keyed by tenant/platform/
//! integration. Both are invoked strictly after transaction commit
//! and are never part of the transaction.

use uuid::Uuid;

use crate::error::NexusResult;
use crate::models::integration::Platform;

/// Work item telling a worker to process one Run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProcessMessage {
    pub run_id: Uuid,
}

pub trait DispatchGateway: Send + Sync {
    /// Point-to-point send of a Run work item. Nothing is awaited
    /// beyond transport acknowledgement.
    fn send_run(
        &self,
        tenant_id: Uuid,
        message: RunProcessMessage,
    ) -> impl Future<Output = NexusResult<()>> + Send;

    /// Ask the run-worker emitter to start a run for an Integration.
    fn trigger_integration_run(
        &self,
        tenant_id: Uuid,
        platform: Platform,
        integration_id: Uuid,
        onboarding: bool,
    ) -> impl Future<Output = NexusResult<()>> + Send;
}
