//! NEXUS Gateways — outward-facing collaborators: HTTP
//! credential-exchange adapters for the platforms that need a
//! handshake during onboarding, and the queue-backed dispatch
//! gateway workers are notified through.
//!
//! All HTTP clients carry a bounded request timeout; a timed-out
//! exchange aborts the onboarding flow exactly like any other
//! upstream rejection.

pub mod discourse;
pub mod github;
pub mod linkedin;
pub mod queue;

pub use discourse::DiscourseApi;
pub use github::{GithubApi, GithubApiConfig};
pub use linkedin::LinkedinApi;
pub use queue::{QueueApi, QueueDispatchGateway};
