//! Orchestrator configuration.

/// Configuration for the integration orchestrator.
///
/// Values that would otherwise be ambient process state (like the
/// shared Discord bot token) are injected here so tests can
/// substitute them.
#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    /// Shared Discord bot token used when a connect call does not
    /// carry its own. `None` makes a caller-supplied token mandatory.
    pub discord_token: Option<String>,
    /// Default for the `update_member_attributes` settings flag on
    /// newly connected integrations.
    pub update_member_attributes: bool,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            discord_token: None,
            update_member_attributes: true,
        }
    }
}
