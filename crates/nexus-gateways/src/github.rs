//! GitHub credential-exchange adapter.
//!
//! Exchanges an OAuth authorization code for a user token, obtains
//! installation-scoped tokens for a GitHub app install, and
//! enumerates the repositories an installation grants access to.

use std::time::Duration;

use nexus_core::error::{NexusError, NexusResult};
use nexus_core::exchange::{GithubExchange, GithubOauthToken};
use nexus_core::models::settings::GithubRepo;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct GithubApiConfig {
    /// OAuth app client id/secret for the code exchange.
    pub client_id: String,
    pub client_secret: String,
    /// App-level bearer token used to mint installation tokens.
    pub app_token: String,
    /// Override for tests; defaults to the public endpoints.
    pub api_base: Option<String>,
    pub oauth_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OauthTokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstallTokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RepoItem {
    name: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct InstalledReposResponse {
    repositories: Vec<RepoItem>,
}

#[derive(Clone)]
pub struct GithubApi {
    client: Client,
    api_base: String,
    oauth_base: String,
    client_id: String,
    client_secret: String,
    app_token: String,
}

impl GithubApi {
    pub fn new(config: GithubApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");

        Self {
            client,
            api_base: config
                .api_base
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            oauth_base: config
                .oauth_base
                .unwrap_or_else(|| "https://github.com".to_string()),
            client_id: config.client_id,
            client_secret: config.client_secret,
            app_token: config.app_token,
        }
    }

    fn headers(&self, bearer: &str) -> NexusResult<HeaderMap> {
        let mut h = HeaderMap::new();
        h.insert(USER_AGENT, HeaderValue::from_static("nexus"));
        h.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let auth = format!("Bearer {bearer}");
        h.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| rejected(format!("invalid header: {e}")))?,
        );
        Ok(h)
    }
}

fn rejected(reason: impl Into<String>) -> NexusError {
    NexusError::UpstreamRejected {
        platform: "github".into(),
        reason: reason.into(),
    }
}

impl GithubExchange for GithubApi {
    async fn exchange_code(&self, code: &str) -> NexusResult<GithubOauthToken> {
        let url = format!("{}/login/oauth/access_token", self.oauth_base);
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| rejected(format!("code exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(format!(
                "code exchange returned {}",
                response.status()
            )));
        }

        let body: OauthTokenResponse = response
            .json()
            .await
            .map_err(|e| rejected(format!("code exchange response: {e}")))?;

        match body.access_token {
            Some(access_token) => Ok(GithubOauthToken {
                access_token,
                refresh_token: body.refresh_token,
            }),
            None => Err(rejected(
                body.error_description
                    .unwrap_or_else(|| "no access token in response".into()),
            )),
        }
    }

    async fn install_token(&self, install_id: &str) -> NexusResult<String> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, install_id
        );
        let response = self
            .client
            .post(&url)
            .headers(self.headers(&self.app_token)?)
            .send()
            .await
            .map_err(|e| rejected(format!("install token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(format!(
                "install token request returned {}",
                response.status()
            )));
        }

        let body: InstallTokenResponse = response
            .json()
            .await
            .map_err(|e| rejected(format!("install token response: {e}")))?;
        Ok(body.token)
    }

    async fn installed_repos(&self, install_token: &str) -> NexusResult<Vec<GithubRepo>> {
        let url = format!("{}/installation/repositories", self.api_base);
        let response = self
            .client
            .get(&url)
            .headers(self.headers(install_token)?)
            .query(&[("per_page", "100")])
            .send()
            .await
            .map_err(|e| rejected(format!("repository enumeration failed: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(format!(
                "repository enumeration returned {}",
                response.status()
            )));
        }

        let body: InstalledReposResponse = response
            .json()
            .await
            .map_err(|e| rejected(format!("repository response: {e}")))?;

        Ok(body
            .repositories
            .into_iter()
            .map(|repo| GithubRepo {
                name: repo.name,
                url: repo.html_url,
            })
            .collect())
    }
}
