//! NEXUS Integrations — the orchestrator that takes a tenant's
//! connection to an external platform through onboarding: credential
//! exchange, transactional persistence, and post-commit dispatch to
//! asynchronous run workers.

pub mod config;
pub mod service;
