//! SurrealDB implementations of the storage ports.

mod integration;
mod run;

pub use integration::SurrealIntegrationStore;
pub use run::SurrealRunLedger;
