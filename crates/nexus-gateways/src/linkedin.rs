//! LinkedIn credential-exchange adapter.
//!
//! Enumerates the organizations the connecting profile administers
//! via the organization ACLs endpoint.

use std::time::Duration;

use nexus_core::error::{NexusError, NexusResult};
use nexus_core::exchange::LinkedinExchange;
use nexus_core::models::settings::LinkedinOrganization;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AclElement {
    #[serde(rename = "organizationalTarget~")]
    organization: Option<OrganizationTarget>,
    #[serde(rename = "organizationalTarget")]
    organization_urn: String,
}

#[derive(Debug, Deserialize)]
struct OrganizationTarget {
    #[serde(rename = "localizedName")]
    localized_name: String,
    #[serde(rename = "vanityName")]
    vanity_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AclsResponse {
    elements: Vec<AclElement>,
}

#[derive(Clone)]
pub struct LinkedinApi {
    client: Client,
    api_base: String,
}

impl LinkedinApi {
    pub fn new(api_base: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");

        Self {
            client,
            api_base: api_base.unwrap_or_else(|| "https://api.linkedin.com".to_string()),
        }
    }
}

fn rejected(reason: impl Into<String>) -> NexusError {
    NexusError::UpstreamRejected {
        platform: "linkedin".into(),
        reason: reason.into(),
    }
}

impl LinkedinExchange for LinkedinApi {
    async fn organizations(&self, token: &str) -> NexusResult<Vec<LinkedinOrganization>> {
        let url = format!("{}/v2/organizationAcls", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", "roleAssignee"),
                ("role", "ADMINISTRATOR"),
                ("state", "APPROVED"),
                (
                    "projection",
                    "(elements*(organizationalTarget~(localizedName,vanityName)))",
                ),
            ])
            .send()
            .await
            .map_err(|e| rejected(format!("organization enumeration failed: {e}")))?;

        if !response.status().is_success() {
            return Err(rejected(format!(
                "organization enumeration returned {}",
                response.status()
            )));
        }

        let body: AclsResponse = response
            .json()
            .await
            .map_err(|e| rejected(format!("organization response: {e}")))?;

        Ok(body
            .elements
            .into_iter()
            .map(|element| {
                // URNs look like `urn:li:organization:12345`; the
                // trailing segment is the stable id.
                let id = element
                    .organization_urn
                    .rsplit(':')
                    .next()
                    .unwrap_or(&element.organization_urn)
                    .to_string();
                let (name, vanity_name) = match element.organization {
                    Some(org) => (org.localized_name, org.vanity_name),
                    None => (id.clone(), None),
                };
                LinkedinOrganization {
                    id,
                    name,
                    vanity_name,
                    in_use: false,
                }
            })
            .collect())
    }
}
