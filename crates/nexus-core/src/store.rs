//! Storage port traits for Integrations and Runs.
//!
//! All operations are async and tenant-scoped. Mutating calls thread
//! an explicit "ambient transaction or none" parameter: `Some(tx)`
//! stages the write into a transaction handle obtained from
//! [`IntegrationStore::begin`], `None` executes immediately. The
//! `(tenant_id, platform)` uniqueness invariant is enforced by the
//! backing store, never by in-process locking.

use uuid::Uuid;

use crate::error::NexusResult;
use crate::models::integration::{
    CreateIntegration, Integration, IntegrationStatus, Platform, UpdateIntegration,
};
use crate::models::run::{CreateRun, Run};

/// A transaction handle. Writes staged into it become durable
/// all-or-nothing at [`commit`](StoreTx::commit); [`rollback`]
/// (StoreTx::rollback) discards them.
pub trait StoreTx: Send {
    fn commit(self) -> impl Future<Output = NexusResult<()>> + Send;
    fn rollback(self) -> impl Future<Output = NexusResult<()>> + Send;
}

/// Filter for Integration count queries.
#[derive(Debug, Clone, Default)]
pub struct IntegrationFilter {
    pub platform: Option<Platform>,
    pub status: Option<IntegrationStatus>,
}

pub trait IntegrationStore: Send + Sync {
    type Tx: StoreTx;

    /// Open a new transaction handle.
    fn begin(&self) -> impl Future<Output = NexusResult<Self::Tx>> + Send;

    /// Look up the tenant's Integration for a platform. Reports
    /// `NotFound` when the pair has never been connected.
    fn find_by_platform(
        &self,
        tenant_id: Uuid,
        platform: Platform,
    ) -> impl Future<Output = NexusResult<Integration>> + Send;

    fn find_all_by_platform(
        &self,
        tenant_id: Uuid,
        platform: Platform,
    ) -> impl Future<Output = NexusResult<Vec<Integration>>> + Send;

    /// Insert a new Integration. A `(tenant, platform)` collision is
    /// reported as `DuplicateConflict` — at execution time for
    /// immediate writes, at commit for staged ones.
    fn create(
        &self,
        input: CreateIntegration,
        tx: Option<&mut Self::Tx>,
    ) -> impl Future<Output = NexusResult<Integration>> + Send;

    /// Merge the provided fields into an existing Integration and
    /// return the merged record.
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateIntegration,
        tx: Option<&mut Self::Tx>,
    ) -> impl Future<Output = NexusResult<Integration>> + Send;

    /// Delete an Integration. Deleting a missing id is `NotFound`,
    /// not a no-op.
    fn destroy(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        tx: Option<&mut Self::Tx>,
    ) -> impl Future<Output = NexusResult<()>> + Send;

    fn count(
        &self,
        tenant_id: Uuid,
        filter: IntegrationFilter,
    ) -> impl Future<Output = NexusResult<u64>> + Send;
}

/// Durable record of onboarding/refresh attempts.
///
/// The ledger only creates runs (always in `pending` state); state
/// transitions belong to the external run-processing worker.
pub trait RunLedger: Send + Sync {
    type Tx: StoreTx;

    fn create(
        &self,
        input: CreateRun,
        tx: Option<&mut Self::Tx>,
    ) -> impl Future<Output = NexusResult<Run>> + Send;
}
