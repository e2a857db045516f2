//! Integration orchestration service — per-platform connect and
//! onboard flows.
//!
//! Every flow has the same shape: validate preconditions, exchange
//! credentials with the external platform (where the platform needs
//! it), stage the Integration write (and, for push-queue platforms, a
//! `pending` Run) into one transaction, commit, and only then notify
//! the asynchronous workers. Adapter failures abort before any write;
//! failures between begin and commit roll the whole batch back; a
//! dispatch failure after commit is surfaced as a distinct
//! partial-success error because the data is already durable.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use nexus_core::analytics::{AnalyticsSink, TrackEvent};
use nexus_core::dispatch::{DispatchGateway, RunProcessMessage};
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::exchange::{DiscourseExchange, GithubExchange, LinkedinExchange};
use nexus_core::models::integration::{
    CreateIntegration, Integration, IntegrationStatus, Platform, UpdateIntegration,
};
use nexus_core::models::run::{CreateRun, Run};
use nexus_core::models::settings::{
    DevtoSettings, DiscordSettings, DiscourseSettings, GitSettings, GithubSettings,
    HackernewsSettings, IntegrationSettings, LinkedinSettings, RedditSettings, SlackSettings,
    StackoverflowSettings, TwitterSettings,
};
use nexus_core::store::{IntegrationStore, RunLedger, StoreTx};

use crate::config::IntegrationsConfig;

/// How a GitHub app setup ended on the GitHub side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GithubSetupAction {
    /// The app was installed; credentials can be exchanged now.
    Install,
    /// An install was requested and awaits an owner's approval.
    Request,
}

/// Input for the GitHub connect flow.
#[derive(Debug)]
pub struct GithubConnectInput {
    pub tenant_id: Uuid,
    /// OAuth authorization code; required for `Install`.
    pub code: Option<String>,
    /// GitHub app installation id.
    pub install_id: String,
    pub setup_action: GithubSetupAction,
}

/// Input for the Discord connect flow.
#[derive(Debug)]
pub struct DiscordConnectInput {
    pub tenant_id: Uuid,
    pub guild_id: String,
    /// Bot token; falls back to the configured shared token.
    pub token: Option<String>,
}

/// Input for the LinkedIn connect flow.
#[derive(Debug)]
pub struct LinkedinConnectInput {
    pub tenant_id: Uuid,
    pub token: String,
    pub refresh_token: Option<String>,
}

/// Input for the LinkedIn organization-selection onboard flow.
#[derive(Debug)]
pub struct LinkedinOnboardInput {
    pub tenant_id: Uuid,
    pub organization_id: String,
}

/// Input for the Reddit onboard flow.
#[derive(Debug)]
pub struct RedditOnboardInput {
    pub tenant_id: Uuid,
    pub subreddits: Vec<String>,
}

/// Input for the Slack connect flow.
#[derive(Debug)]
pub struct SlackConnectInput {
    pub tenant_id: Uuid,
    pub token: String,
}

/// Input for the Twitter connect flow.
#[derive(Debug)]
pub struct TwitterConnectInput {
    pub tenant_id: Uuid,
    pub profile_id: String,
    pub token: String,
    pub refresh_token: Option<String>,
    pub hashtags: Vec<String>,
}

/// Input for the Stack Overflow connect flow.
#[derive(Debug)]
pub struct StackoverflowConnectInput {
    pub tenant_id: Uuid,
    pub tags: Vec<String>,
    pub keys: Vec<String>,
}

/// Input for the Discourse connect flow.
#[derive(Debug)]
pub struct DiscourseConnectInput {
    pub tenant_id: Uuid,
    pub forum_hostname: String,
    pub api_key: String,
    pub webhook_secret: Option<String>,
}

/// Input for the Hacker News connect flow.
#[derive(Debug)]
pub struct HackernewsConnectInput {
    pub tenant_id: Uuid,
    pub keywords: Vec<String>,
    pub urls: Vec<String>,
}

/// Input for the Dev.to connect flow.
#[derive(Debug)]
pub struct DevtoConnectInput {
    pub tenant_id: Uuid,
    pub organizations: Vec<String>,
    pub users: Vec<String>,
}

/// Input for the Git connect flow.
#[derive(Debug)]
pub struct GitConnectInput {
    pub tenant_id: Uuid,
    pub remotes: Vec<String>,
}

/// How the committed Integration is handed to the workers.
enum DispatchPlan {
    /// Point-to-point work-queue send carrying the Run id.
    Queue,
    /// Trigger-emitter call; `None` derives the onboarding flag from
    /// whether the Integration was created (first connect) or updated.
    Trigger { onboarding: Option<bool> },
    /// No worker involvement (Git; GitHub awaiting approval;
    /// LinkedIn awaiting organization selection).
    None,
}

struct PersistOutcome {
    integration: Integration,
    created: bool,
    run: Option<Run>,
}

/// Integration orchestration service.
///
/// Generic over the storage, dispatch, exchange, and analytics ports
/// so the orchestrator has no dependency on the database or HTTP
/// crates.
pub struct IntegrationService<S, R, D, G, L, F, A>
where
    S: IntegrationStore,
    R: RunLedger<Tx = S::Tx>,
    D: DispatchGateway,
    G: GithubExchange,
    L: LinkedinExchange,
    F: DiscourseExchange,
    A: AnalyticsSink,
{
    store: S,
    ledger: R,
    dispatch: D,
    github: G,
    linkedin: L,
    discourse: F,
    analytics: A,
    config: IntegrationsConfig,
}

impl<S, R, D, G, L, F, A> IntegrationService<S, R, D, G, L, F, A>
where
    S: IntegrationStore,
    R: RunLedger<Tx = S::Tx>,
    D: DispatchGateway,
    G: GithubExchange,
    L: LinkedinExchange,
    F: DiscourseExchange,
    A: AnalyticsSink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: S,
        ledger: R,
        dispatch: D,
        github: G,
        linkedin: L,
        discourse: F,
        analytics: A,
        config: IntegrationsConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            dispatch,
            github,
            linkedin,
            discourse,
            analytics,
            config,
        }
    }

    // -------------------------------------------------------------------
    // Create-or-update primitive
    // -------------------------------------------------------------------

    /// Locate the tenant's Integration for the candidate's platform
    /// and merge-update it, or insert it when none exists yet.
    ///
    /// Idempotent in effect: the same candidate applied twice leaves
    /// one Integration row, updated the second time. A concurrent
    /// create racing on the `(tenant, platform)` unique constraint
    /// surfaces as `DuplicateConflict`; the loser retries as an
    /// update. Callers may thread their own transaction handle;
    /// without one the write executes immediately.
    pub async fn create_or_update(
        &self,
        candidate: CreateIntegration,
        tx: Option<&mut S::Tx>,
    ) -> NexusResult<Integration> {
        let (integration, created) = self.create_or_update_inner(candidate, tx).await?;
        self.track(created, &integration).await;
        Ok(integration)
    }

    async fn create_or_update_inner(
        &self,
        candidate: CreateIntegration,
        tx: Option<&mut S::Tx>,
    ) -> NexusResult<(Integration, bool)> {
        if candidate.settings.platform() != candidate.platform {
            return Err(NexusError::InvalidInput {
                message: format!(
                    "settings document is for {} but the integration is for {}",
                    candidate.settings.platform(),
                    candidate.platform
                ),
            });
        }

        match self
            .store
            .find_by_platform(candidate.tenant_id, candidate.platform)
            .await
        {
            Ok(existing) => {
                let updated = self
                    .store
                    .update(candidate.tenant_id, existing.id, candidate.into_update(), tx)
                    .await?;
                Ok((updated, false))
            }
            Err(NexusError::NotFound { .. }) => {
                let created = self.store.create(candidate, tx).await?;
                Ok((created, true))
            }
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------
    // Platform flows
    // -------------------------------------------------------------------

    /// Connect a GitHub app installation.
    ///
    /// An `Install` setup action exchanges the authorization code,
    /// obtains an installation token, enumerates the installed
    /// repositories, and hands a `pending` Run to the work queue. A
    /// `Request` setup action only records the pending approval —
    /// no credentials, no Run, no dispatch.
    pub async fn connect_github(&self, input: GithubConnectInput) -> NexusResult<Integration> {
        match input.setup_action {
            GithubSetupAction::Request => {
                let candidate = CreateIntegration {
                    tenant_id: input.tenant_id,
                    platform: Platform::Github,
                    status: IntegrationStatus::WaitingApproval,
                    token: None,
                    refresh_token: None,
                    integration_identifier: Some(input.install_id),
                    settings: IntegrationSettings::Github(GithubSettings {
                        repos: Vec::new(),
                        update_member_attributes: self.config.update_member_attributes,
                    }),
                    limit_count: 0,
                    limit_last_reset_at: None,
                };
                let outcome = self.persist(candidate, false).await?;
                Ok(outcome.integration)
            }
            GithubSetupAction::Install => {
                let code = input.code.ok_or_else(|| NexusError::InvalidInput {
                    message: "authorization code is required to finish a GitHub install".into(),
                })?;

                // 1. Exchange credentials before touching storage.
                let oauth = self
                    .github
                    .exchange_code(&code)
                    .await
                    .map_err(|e| upstream(Platform::Github, e))?;
                let install_token = self
                    .github
                    .install_token(&input.install_id)
                    .await
                    .map_err(|e| upstream(Platform::Github, e))?;
                let repos = self
                    .github
                    .installed_repos(&install_token)
                    .await
                    .map_err(|e| upstream(Platform::Github, e))?;

                // 2. Persist and enqueue the run.
                let candidate = CreateIntegration {
                    tenant_id: input.tenant_id,
                    platform: Platform::Github,
                    status: IntegrationStatus::InProgress,
                    token: Some(oauth.access_token),
                    refresh_token: oauth.refresh_token,
                    integration_identifier: Some(input.install_id),
                    settings: IntegrationSettings::Github(GithubSettings {
                        repos,
                        update_member_attributes: self.config.update_member_attributes,
                    }),
                    limit_count: 0,
                    limit_last_reset_at: None,
                };
                let outcome = self.persist(candidate, true).await?;
                self.finish(outcome, DispatchPlan::Queue).await
            }
        }
    }

    /// Connect a Discord guild. The bot token may come with the call
    /// or fall back to the configured shared token.
    pub async fn connect_discord(&self, input: DiscordConnectInput) -> NexusResult<Integration> {
        let token = input
            .token
            .or_else(|| self.config.discord_token.clone())
            .ok_or_else(|| NexusError::InvalidInput {
                message: "no Discord token supplied and no shared token configured".into(),
            })?;

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Discord,
            status: IntegrationStatus::InProgress,
            token: Some(token),
            refresh_token: None,
            integration_identifier: Some(input.guild_id),
            settings: IntegrationSettings::Discord(DiscordSettings {
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, true).await?;
        self.finish(outcome, DispatchPlan::Queue).await
    }

    /// Connect a LinkedIn profile.
    ///
    /// Enumerates the organizations the profile administers. With
    /// exactly one organization it is selected immediately
    /// (`in_use = true`, status `in-progress`) and a run is
    /// triggered; with several, the Integration parks in
    /// `pending-action` until [`onboard_linkedin`]
    /// (Self::onboard_linkedin) confirms a choice.
    pub async fn connect_linkedin(&self, input: LinkedinConnectInput) -> NexusResult<Integration> {
        let mut organizations = self
            .linkedin
            .organizations(&input.token)
            .await
            .map_err(|e| upstream(Platform::Linkedin, e))?;

        if organizations.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "the LinkedIn profile administers no organizations".into(),
            });
        }

        let status = if organizations.len() == 1 {
            organizations[0].in_use = true;
            IntegrationStatus::InProgress
        } else {
            IntegrationStatus::PendingAction
        };

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Linkedin,
            status,
            token: Some(input.token),
            refresh_token: input.refresh_token,
            integration_identifier: None,
            settings: IntegrationSettings::Linkedin(LinkedinSettings {
                organizations,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;

        let plan = match status {
            IntegrationStatus::InProgress => DispatchPlan::Trigger {
                onboarding: Some(true),
            },
            _ => DispatchPlan::None,
        };
        self.finish(outcome, plan).await
    }

    /// Confirm the organization a parked LinkedIn Integration should
    /// ingest, and trigger its onboarding run.
    ///
    /// Requires the Integration to be in `pending-action`; the chosen
    /// organization must exist in the stored settings and not already
    /// be in use. Organizations that were not chosen stay in the
    /// settings, only flagged.
    pub async fn onboard_linkedin(&self, input: LinkedinOnboardInput) -> NexusResult<Integration> {
        // 1. The Integration must exist and await a selection.
        let integration = self
            .store
            .find_by_platform(input.tenant_id, Platform::Linkedin)
            .await?;

        if integration.status != IntegrationStatus::PendingAction {
            return Err(NexusError::WrongState {
                expected: IntegrationStatus::PendingAction,
                actual: integration.status,
            });
        }

        let IntegrationSettings::Linkedin(mut settings) = integration.settings else {
            return Err(NexusError::Internal(
                "LinkedIn integration carries a non-LinkedIn settings document".into(),
            ));
        };

        // 2. The chosen organization must be stored and still free.
        let organization = settings
            .organizations
            .iter_mut()
            .find(|org| org.id == input.organization_id && !org.in_use)
            .ok_or_else(|| NexusError::NotFound {
                entity: "linkedin-organization".into(),
                id: input.organization_id.clone(),
            })?;
        organization.in_use = true;

        // 3. Re-persist the full settings document and transition.
        let mut tx = self.store.begin().await?;
        let update = UpdateIntegration {
            status: Some(IntegrationStatus::InProgress),
            settings: Some(IntegrationSettings::Linkedin(settings)),
            ..Default::default()
        };
        let updated = match self
            .store
            .update(input.tenant_id, integration.id, update, Some(&mut tx))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.rollback(tx).await;
                return Err(e);
            }
        };
        tx.commit().await?;
        self.track(false, &updated).await;

        // 4. Trigger the onboarding run, strictly after commit.
        self.finish(
            PersistOutcome {
                integration: updated,
                created: false,
                run: None,
            },
            DispatchPlan::Trigger {
                onboarding: Some(true),
            },
        )
        .await
    }

    /// Store the subreddits a Reddit Integration ingests and trigger
    /// its onboarding run. Reddit tokens are pre-provisioned, so no
    /// credential exchange happens here.
    pub async fn onboard_reddit(&self, input: RedditOnboardInput) -> NexusResult<Integration> {
        if input.subreddits.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "at least one subreddit is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Reddit,
            status: IntegrationStatus::InProgress,
            token: None,
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Reddit(RedditSettings {
                subreddits: input.subreddits,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        self.finish(
            outcome,
            DispatchPlan::Trigger {
                onboarding: Some(true),
            },
        )
        .await
    }

    /// Connect a Slack workspace with a token obtained by the OAuth
    /// callback.
    pub async fn connect_slack(&self, input: SlackConnectInput) -> NexusResult<Integration> {
        if input.token.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "a Slack token is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Slack,
            status: IntegrationStatus::InProgress,
            token: Some(input.token),
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Slack(SlackSettings {
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        self.finish(outcome, DispatchPlan::Trigger { onboarding: None })
            .await
    }

    /// Connect a Twitter profile. Resets the rate-limit bookkeeping
    /// and enqueues a run on the work queue.
    pub async fn connect_twitter(&self, input: TwitterConnectInput) -> NexusResult<Integration> {
        if input.token.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "a Twitter token is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Twitter,
            status: IntegrationStatus::InProgress,
            token: Some(input.token),
            refresh_token: input.refresh_token,
            integration_identifier: Some(input.profile_id),
            settings: IntegrationSettings::Twitter(TwitterSettings {
                hashtags: input.hashtags,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: Some(Utc::now()),
        };
        let outcome = self.persist(candidate, true).await?;
        self.finish(outcome, DispatchPlan::Queue).await
    }

    /// Connect or update a Stack Overflow Integration (tag- and/or
    /// key-driven ingestion).
    pub async fn connect_stackoverflow(
        &self,
        input: StackoverflowConnectInput,
    ) -> NexusResult<Integration> {
        if input.tags.is_empty() && input.keys.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "at least one Stack Overflow tag or key is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Stackoverflow,
            status: IntegrationStatus::InProgress,
            token: None,
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Stackoverflow(StackoverflowSettings {
                tags: input.tags,
                keys: input.keys,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        self.finish(outcome, DispatchPlan::Trigger { onboarding: None })
            .await
    }

    /// Connect or update a Discourse forum. The API key is validated
    /// against the forum before anything is written.
    pub async fn connect_discourse(&self, input: DiscourseConnectInput) -> NexusResult<Integration> {
        if input.forum_hostname.is_empty() || input.api_key.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "a Discourse forum hostname and API key are required".into(),
            });
        }

        self.discourse
            .validate_credentials(&input.forum_hostname, &input.api_key)
            .await
            .map_err(|e| upstream(Platform::Discourse, e))?;

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Discourse,
            status: IntegrationStatus::InProgress,
            token: None,
            refresh_token: None,
            integration_identifier: Some(input.forum_hostname.clone()),
            settings: IntegrationSettings::Discourse(DiscourseSettings {
                forum_hostname: input.forum_hostname,
                api_key: input.api_key,
                webhook_secret: input.webhook_secret,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, true).await?;
        self.finish(outcome, DispatchPlan::Queue).await
    }

    /// Connect or update a Hacker News Integration (keyword-driven
    /// ingestion; no credentials involved).
    pub async fn connect_hackernews(
        &self,
        input: HackernewsConnectInput,
    ) -> NexusResult<Integration> {
        if input.keywords.is_empty() && input.urls.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "at least one Hacker News keyword or URL is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Hackernews,
            status: IntegrationStatus::InProgress,
            token: None,
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Hackernews(HackernewsSettings {
                keywords: input.keywords,
                urls: input.urls,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        self.finish(outcome, DispatchPlan::Trigger { onboarding: None })
            .await
    }

    /// Connect or update a Dev.to Integration.
    pub async fn connect_devto(&self, input: DevtoConnectInput) -> NexusResult<Integration> {
        if input.organizations.is_empty() && input.users.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "at least one Dev.to organization or user is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Devto,
            status: IntegrationStatus::InProgress,
            token: None,
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Devto(DevtoSettings {
                organizations: input.organizations,
                users: input.users,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        self.finish(outcome, DispatchPlan::Trigger { onboarding: None })
            .await
    }

    /// Connect or update a Git Integration. Remotes are stored
    /// immediately, the status is terminal `done`, and no worker is
    /// involved.
    pub async fn connect_git(&self, input: GitConnectInput) -> NexusResult<Integration> {
        if input.remotes.is_empty() {
            return Err(NexusError::InvalidInput {
                message: "at least one Git remote is required".into(),
            });
        }

        let candidate = CreateIntegration {
            tenant_id: input.tenant_id,
            platform: Platform::Git,
            status: IntegrationStatus::Done,
            token: None,
            refresh_token: None,
            integration_identifier: None,
            settings: IntegrationSettings::Git(GitSettings {
                remotes: input.remotes,
                update_member_attributes: self.config.update_member_attributes,
            }),
            limit_count: 0,
            limit_last_reset_at: None,
        };
        let outcome = self.persist(candidate, false).await?;
        Ok(outcome.integration)
    }

    /// Delete a batch of Integrations in one transaction. Any single
    /// failure — including a missing id — rolls the whole batch back.
    /// Ids are not de-duplicated here; callers must not repeat them.
    pub async fn destroy_all(&self, tenant_id: Uuid, ids: &[Uuid]) -> NexusResult<()> {
        let mut tx = self.store.begin().await?;

        for id in ids {
            if let Err(e) = self.store.destroy(tenant_id, *id, Some(&mut tx)).await {
                self.rollback(tx).await;
                return Err(e);
            }
        }

        tx.commit().await
    }

    // -------------------------------------------------------------------
    // Shared plumbing
    // -------------------------------------------------------------------

    /// Stage the create-or-update (and optional Run) into one
    /// transaction and commit. Any failure after begin rolls back the
    /// whole batch. Analytics are emitted after commit, best-effort.
    async fn persist(
        &self,
        candidate: CreateIntegration,
        create_run: bool,
    ) -> NexusResult<PersistOutcome> {
        let mut tx = self.store.begin().await?;

        let outcome = match self.stage(candidate, create_run, &mut tx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.rollback(tx).await;
                return Err(e);
            }
        };

        tx.commit().await?;
        self.track(outcome.created, &outcome.integration).await;
        Ok(outcome)
    }

    async fn stage(
        &self,
        candidate: CreateIntegration,
        create_run: bool,
        tx: &mut S::Tx,
    ) -> NexusResult<PersistOutcome> {
        let (integration, created) = self.create_or_update_inner(candidate, Some(tx)).await?;

        let run = if create_run {
            // The tenant id is copied from the freshly written
            // Integration, which keeps the two records' tenants equal
            // by construction.
            Some(
                self.ledger
                    .create(
                        CreateRun {
                            integration_id: integration.id,
                            tenant_id: integration.tenant_id,
                            onboarding: created,
                        },
                        Some(tx),
                    )
                    .await?,
            )
        } else {
            None
        };

        Ok(PersistOutcome {
            integration,
            created,
            run,
        })
    }

    /// Notify the workers about a committed Integration. A dispatch
    /// failure here is a partial success: the data is durable, so it
    /// is reported as `DispatchFailed` rather than a hard failure.
    async fn finish(
        &self,
        outcome: PersistOutcome,
        plan: DispatchPlan,
    ) -> NexusResult<Integration> {
        let PersistOutcome {
            integration,
            created,
            run,
        } = outcome;

        let result = match plan {
            DispatchPlan::None => return Ok(integration),
            DispatchPlan::Queue => {
                let run = run.as_ref().ok_or_else(|| {
                    NexusError::Internal("queue dispatch requested without a run".into())
                })?;
                self.dispatch
                    .send_run(integration.tenant_id, RunProcessMessage { run_id: run.id })
                    .await
            }
            DispatchPlan::Trigger { onboarding } => {
                self.dispatch
                    .trigger_integration_run(
                        integration.tenant_id,
                        integration.platform,
                        integration.id,
                        onboarding.unwrap_or(created),
                    )
                    .await
            }
        };

        match result {
            Ok(()) => Ok(integration),
            Err(e) => Err(NexusError::DispatchFailed {
                integration_id: integration.id,
                reason: e.to_string(),
            }),
        }
    }

    async fn rollback(&self, tx: S::Tx) {
        if let Err(e) = tx.rollback().await {
            warn!(error = %e, "transaction rollback failed");
        }
    }

    /// Best-effort analytics; failures are logged and discarded.
    async fn track(&self, created: bool, integration: &Integration) {
        let event = TrackEvent {
            tenant_id: integration.tenant_id,
            name: if created {
                "integration-created".into()
            } else {
                "integration-updated".into()
            },
            platform: integration.platform,
            integration_id: integration.id,
            status: integration.status,
        };
        if let Err(e) = self.analytics.track(event).await {
            warn!(
                error = %e,
                platform = %integration.platform,
                "analytics tracking failed"
            );
        }
    }
}

/// Classify an adapter failure as an upstream rejection unless it
/// already is one.
fn upstream(platform: Platform, err: NexusError) -> NexusError {
    match err {
        e @ NexusError::UpstreamRejected { .. } => e,
        other => NexusError::UpstreamRejected {
            platform: platform.to_string(),
            reason: other.to_string(),
        },
    }
}
