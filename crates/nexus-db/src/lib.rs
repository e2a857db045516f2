//! NEXUS Database — SurrealDB connection management and the durable
//! implementations of the Integration Store and Run Ledger ports.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The buffered atomic transaction handle ([`SurrealTx`])
//! - Store implementations ([`SurrealIntegrationStore`],
//!   [`SurrealRunLedger`])

mod connection;
mod error;
mod schema;
pub mod store;
mod transaction;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use store::{SurrealIntegrationStore, SurrealRunLedger};
pub use transaction::SurrealTx;
