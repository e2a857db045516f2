//! Per-platform integration settings.
//!
//! Settings are loosely-typed documents on the wire (one JSON object
//! per platform). They are modeled as a tagged union keyed by
//! platform so each variant keeps field safety while the store only
//! ever sees a flexible JSON object.

use serde::{Deserialize, Serialize};

use crate::models::integration::Platform;

/// A repository enumerated from a GitHub app installation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GithubRepo {
    pub name: String,
    pub url: String,
}

/// An organization the connecting LinkedIn profile administers.
///
/// Organizations are never deleted from settings once stored; the
/// chosen one is flagged `in_use` during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedinOrganization {
    pub id: String,
    pub name: String,
    pub vanity_name: Option<String>,
    pub in_use: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GithubSettings {
    pub repos: Vec<GithubRepo>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiscordSettings {
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LinkedinSettings {
    pub organizations: Vec<LinkedinOrganization>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RedditSettings {
    pub subreddits: Vec<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SlackSettings {
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TwitterSettings {
    pub hashtags: Vec<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StackoverflowSettings {
    pub tags: Vec<String>,
    pub keys: Vec<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiscourseSettings {
    pub forum_hostname: String,
    pub api_key: String,
    pub webhook_secret: Option<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HackernewsSettings {
    pub keywords: Vec<String>,
    pub urls: Vec<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DevtoSettings {
    pub organizations: Vec<String>,
    pub users: Vec<String>,
    pub update_member_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GitSettings {
    pub remotes: Vec<String>,
    pub update_member_attributes: bool,
}

/// Platform-specific settings document, tagged by platform name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum IntegrationSettings {
    Github(GithubSettings),
    Discord(DiscordSettings),
    Linkedin(LinkedinSettings),
    Reddit(RedditSettings),
    Slack(SlackSettings),
    Twitter(TwitterSettings),
    Stackoverflow(StackoverflowSettings),
    Discourse(DiscourseSettings),
    Hackernews(HackernewsSettings),
    Devto(DevtoSettings),
    Git(GitSettings),
}

impl IntegrationSettings {
    /// The platform this settings variant belongs to. Candidate
    /// payloads whose settings disagree with their declared platform
    /// are rejected before any write.
    pub fn platform(&self) -> Platform {
        match self {
            IntegrationSettings::Github(_) => Platform::Github,
            IntegrationSettings::Discord(_) => Platform::Discord,
            IntegrationSettings::Linkedin(_) => Platform::Linkedin,
            IntegrationSettings::Reddit(_) => Platform::Reddit,
            IntegrationSettings::Slack(_) => Platform::Slack,
            IntegrationSettings::Twitter(_) => Platform::Twitter,
            IntegrationSettings::Stackoverflow(_) => Platform::Stackoverflow,
            IntegrationSettings::Discourse(_) => Platform::Discourse,
            IntegrationSettings::Hackernews(_) => Platform::Hackernews,
            IntegrationSettings::Devto(_) => Platform::Devto,
            IntegrationSettings::Git(_) => Platform::Git,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_is_tagged_by_platform() {
        let settings = IntegrationSettings::Reddit(RedditSettings {
            subreddits: vec!["rust".into()],
            update_member_attributes: true,
        });

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["platform"], "reddit");
        assert_eq!(value["subreddits"][0], "rust");

        let back: IntegrationSettings = serde_json::from_value(value).unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.platform(), Platform::Reddit);
    }
}
