//! NEXUS Core — domain models, error taxonomy, and the port traits
//! the integration orchestrator is composed from.
//!
//! This crate has no I/O dependencies. Storage, credential exchange,
//! dispatch, and analytics are all expressed as traits implemented by
//! the `nexus-db` and `nexus-gateways` crates (or by test doubles).

pub mod analytics;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod models;
pub mod store;
