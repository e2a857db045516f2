//! Integration domain model.
//!
//! An Integration is the durable record of a tenant's connection to
//! one external platform. There is exactly one Integration per
//! `(tenant_id, platform)` pair; the store enforces this with a
//! unique index, and all writes funnel through the orchestrator's
//! create-or-update primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::settings::IntegrationSettings;

/// External platform an Integration connects to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    Discord,
    Linkedin,
    Reddit,
    Slack,
    Twitter,
    Stackoverflow,
    Discourse,
    Hackernews,
    Devto,
    Git,
}

impl Platform {
    /// Wire/storage name (lowercase, matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Github => "github",
            Platform::Discord => "discord",
            Platform::Linkedin => "linkedin",
            Platform::Reddit => "reddit",
            Platform::Slack => "slack",
            Platform::Twitter => "twitter",
            Platform::Stackoverflow => "stackoverflow",
            Platform::Discourse => "discourse",
            Platform::Hackernews => "hackernews",
            Platform::Devto => "devto",
            Platform::Git => "git",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onboarding state of an Integration.
///
/// Terminal run outcomes live on the [`Run`](crate::models::run::Run)
/// record, not here — `Done` means onboarding finished, `Error` means
/// the worker reported a failed ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationStatus {
    WaitingApproval,
    PendingAction,
    InProgress,
    Done,
    Error,
}

impl IntegrationStatus {
    /// Wire/storage name (kebab-case, matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::WaitingApproval => "waiting-approval",
            IntegrationStatus::PendingAction => "pending-action",
            IntegrationStatus::InProgress => "in-progress",
            IntegrationStatus::Done => "done",
            IntegrationStatus::Error => "error",
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant's connection to one external platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub platform: Platform,
    pub status: IntegrationStatus,
    /// Opaque platform credential, if the platform uses one.
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    /// Platform-specific external identifier correlating this record
    /// to an external resource (install id, guild id, profile id).
    pub integration_identifier: Option<String>,
    /// Platform-specific settings document.
    pub settings: IntegrationSettings,
    /// Rate-limit bookkeeping for platforms with API quotas.
    pub limit_count: i64,
    pub limit_last_reset_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new Integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntegration {
    pub tenant_id: Uuid,
    pub platform: Platform,
    pub status: IntegrationStatus,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub integration_identifier: Option<String>,
    pub settings: IntegrationSettings,
    pub limit_count: i64,
    pub limit_last_reset_at: Option<DateTime<Utc>>,
}

impl CreateIntegration {
    /// Convert a creation candidate into the merge-update applied when
    /// an Integration for the `(tenant, platform)` pair already exists.
    pub fn into_update(self) -> UpdateIntegration {
        UpdateIntegration {
            status: Some(self.status),
            token: self.token,
            refresh_token: self.refresh_token,
            integration_identifier: self.integration_identifier,
            settings: Some(self.settings),
            limit_count: Some(self.limit_count),
            limit_last_reset_at: self.limit_last_reset_at,
        }
    }
}

/// Fields that can be updated on an existing Integration.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateIntegration {
    pub status: Option<IntegrationStatus>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub integration_identifier: Option<String>,
    pub settings: Option<IntegrationSettings>,
    pub limit_count: Option<i64>,
    pub limit_last_reset_at: Option<DateTime<Utc>>,
}
