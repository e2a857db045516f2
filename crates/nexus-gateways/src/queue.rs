//! Queue-backed dispatch gateway.
//!
//! Maps worker notifications onto a message transport behind the
//! narrow [`QueueApi`] port (an SQS-style `send_message`), so the
//! gateway itself stays testable without a real broker. Message
//! bodies are serialized JSON; delivery is at-least-once and nothing
//! is awaited beyond transport acknowledgement.

use nexus_core::dispatch::{DispatchGateway, RunProcessMessage};
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::models::integration::Platform;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Minimal transport surface the gateway needs.
pub trait QueueApi: Send + Sync {
    fn send_message(
        &self,
        queue_url: &str,
        body: String,
    ) -> impl Future<Output = NexusResult<()>> + Send;
}

#[derive(Debug, Serialize)]
struct RunQueueBody {
    #[serde(rename = "type")]
    kind: &'static str,
    tenant_id: Uuid,
    run_id: Uuid,
}

#[derive(Debug, Serialize)]
struct TriggerQueueBody {
    #[serde(rename = "type")]
    kind: &'static str,
    tenant_id: Uuid,
    platform: Platform,
    integration_id: Uuid,
    onboarding: bool,
}

/// Dispatch gateway over two queues: a point-to-point run-processing
/// queue and the run-worker trigger queue.
#[derive(Clone)]
pub struct QueueDispatchGateway<C: QueueApi> {
    client: C,
    runs_queue_url: String,
    trigger_queue_url: String,
}

impl<C: QueueApi> QueueDispatchGateway<C> {
    pub fn new(
        client: C,
        runs_queue_url: impl Into<String>,
        trigger_queue_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            runs_queue_url: runs_queue_url.into(),
            trigger_queue_url: trigger_queue_url.into(),
        }
    }
}

impl<C: QueueApi> DispatchGateway for QueueDispatchGateway<C> {
    async fn send_run(&self, tenant_id: Uuid, message: RunProcessMessage) -> NexusResult<()> {
        let body = serde_json::to_string(&RunQueueBody {
            kind: "integration_run_process",
            tenant_id,
            run_id: message.run_id,
        })
        .map_err(|e| NexusError::Internal(format!("serialize run message: {e}")))?;

        debug!(%tenant_id, run_id = %message.run_id, "sending run work item");
        self.client.send_message(&self.runs_queue_url, body).await
    }

    async fn trigger_integration_run(
        &self,
        tenant_id: Uuid,
        platform: Platform,
        integration_id: Uuid,
        onboarding: bool,
    ) -> NexusResult<()> {
        let body = serde_json::to_string(&TriggerQueueBody {
            kind: "integration_run_trigger",
            tenant_id,
            platform,
            integration_id,
            onboarding,
        })
        .map_err(|e| NexusError::Internal(format!("serialize trigger message: {e}")))?;

        debug!(%tenant_id, %platform, %integration_id, "triggering integration run");
        self.client
            .send_message(&self.trigger_queue_url, body)
            .await
    }
}
