//! Run ledger tests against an in-memory SurrealDB engine.

use nexus_core::models::integration::{CreateIntegration, IntegrationStatus, Platform};
use nexus_core::models::run::{CreateRun, RunState};
use nexus_core::models::settings::{DiscordSettings, IntegrationSettings};
use nexus_core::store::{IntegrationStore, RunLedger, StoreTx};
use nexus_db::{SurrealIntegrationStore, SurrealRunLedger, run_migrations};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

#[derive(Debug, SurrealValue)]
struct RunRow {
    integration_id: String,
    tenant_id: String,
    onboarding: bool,
    state: String,
}

async fn stored_runs(db: &Surreal<Db>) -> Vec<RunRow> {
    let mut result = db.query("SELECT * FROM run").await.unwrap();
    result.take(0).unwrap()
}

#[tokio::test]
async fn created_runs_are_always_pending() {
    let db = setup().await;
    let ledger = SurrealRunLedger::new(db.clone());

    let integration_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    let run = ledger
        .create(
            CreateRun {
                integration_id,
                tenant_id,
                onboarding: true,
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(run.state, RunState::Pending);
    assert_eq!(run.integration_id, integration_id);
    assert_eq!(run.tenant_id, tenant_id);
    assert!(run.onboarding);

    let rows = stored_runs(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].state, "pending");
    assert_eq!(rows[0].integration_id, integration_id.to_string());
    assert_eq!(rows[0].tenant_id, tenant_id.to_string());
    assert!(rows[0].onboarding);
}

#[tokio::test]
async fn one_integration_accumulates_many_runs() {
    let db = setup().await;
    let ledger = SurrealRunLedger::new(db.clone());

    let integration_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    for onboarding in [true, false, false] {
        ledger
            .create(
                CreateRun {
                    integration_id,
                    tenant_id,
                    onboarding,
                },
                None,
            )
            .await
            .unwrap();
    }

    let rows = stored_runs(&db).await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().filter(|r| r.onboarding).count(), 1);
}

#[tokio::test]
async fn staged_run_is_invisible_until_commit() {
    let db = setup().await;
    let store = SurrealIntegrationStore::new(db.clone());
    let ledger = SurrealRunLedger::new(db.clone());

    let mut tx = store.begin().await.unwrap();
    ledger
        .create(
            CreateRun {
                integration_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                onboarding: true,
            },
            Some(&mut tx),
        )
        .await
        .unwrap();

    assert!(stored_runs(&db).await.is_empty());

    tx.commit().await.unwrap();
    assert_eq!(stored_runs(&db).await.len(), 1);
}

#[tokio::test]
async fn integration_and_run_share_one_atomic_batch() {
    let db = setup().await;
    let store = SurrealIntegrationStore::new(db.clone());
    let ledger = SurrealRunLedger::new(db.clone());
    let tenant_id = Uuid::new_v4();

    let candidate = CreateIntegration {
        tenant_id,
        platform: Platform::Discord,
        status: IntegrationStatus::InProgress,
        token: Some("bot-token".into()),
        refresh_token: None,
        integration_identifier: Some("guild-1".into()),
        settings: IntegrationSettings::Discord(DiscordSettings {
            update_member_attributes: true,
        }),
        limit_count: 0,
        limit_last_reset_at: None,
    };

    // First connect: integration and run land together.
    let mut tx = store.begin().await.unwrap();
    let integration = store.create(candidate.clone(), Some(&mut tx)).await.unwrap();
    ledger
        .create(
            CreateRun {
                integration_id: integration.id,
                tenant_id,
                onboarding: true,
            },
            Some(&mut tx),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(stored_runs(&db).await.len(), 1);
    store
        .find_by_platform(tenant_id, Platform::Discord)
        .await
        .unwrap();

    // A conflicting create in a later batch takes its staged run down
    // with it.
    let mut tx = store.begin().await.unwrap();
    let duplicate = store.create(candidate, Some(&mut tx)).await.unwrap();
    ledger
        .create(
            CreateRun {
                integration_id: duplicate.id,
                tenant_id,
                onboarding: true,
            },
            Some(&mut tx),
        )
        .await
        .unwrap();
    assert!(tx.commit().await.is_err());

    assert_eq!(stored_runs(&db).await.len(), 1);
}

#[tokio::test]
async fn run_state_assertion_rejects_unknown_values() {
    let db = setup().await;

    let result = db
        .query(
            "CREATE run SET integration_id = 'x', tenant_id = 'y', \
             onboarding = false, state = 'sideways'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err());
    assert!(stored_runs(&db).await.is_empty());
}
