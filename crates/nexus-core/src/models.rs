//! Domain models for NEXUS.
//!
//! These are the core types shared across all crates.

pub mod integration;
pub mod run;
pub mod settings;
