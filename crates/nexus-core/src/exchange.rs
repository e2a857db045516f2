//! Credential-exchange ports — the platform-specific handshakes run
//! synchronously during onboarding, before any storage write.
//!
//! Implementations live in `nexus-gateways`. Every failure is
//! classified as `UpstreamRejected` and aborts the flow; HTTP
//! implementations must apply a bounded request timeout.

use crate::error::NexusResult;
use crate::models::settings::{GithubRepo, LinkedinOrganization};

/// Token pair obtained by exchanging a GitHub authorization code.
#[derive(Debug, Clone)]
pub struct GithubOauthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub trait GithubExchange: Send + Sync {
    /// Exchange an OAuth authorization code for a user access token.
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = NexusResult<GithubOauthToken>> + Send;

    /// Obtain an installation-scoped token for a GitHub app install.
    fn install_token(&self, install_id: &str)
    -> impl Future<Output = NexusResult<String>> + Send;

    /// Enumerate the repositories the installation grants access to.
    fn installed_repos(
        &self,
        install_token: &str,
    ) -> impl Future<Output = NexusResult<Vec<GithubRepo>>> + Send;
}

pub trait LinkedinExchange: Send + Sync {
    /// Enumerate organizations the token's profile administers.
    /// Returned organizations carry `in_use = false`.
    fn organizations(
        &self,
        token: &str,
    ) -> impl Future<Output = NexusResult<Vec<LinkedinOrganization>>> + Send;
}

pub trait DiscourseExchange: Send + Sync {
    /// Validate an API key against the forum's identity endpoint.
    fn validate_credentials(
        &self,
        forum_hostname: &str,
        api_key: &str,
    ) -> impl Future<Output = NexusResult<()>> + Send;
}
