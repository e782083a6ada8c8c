use envconfig::Envconfig;

use crate::client::retry::DEFAULT_MAX_ATTEMPTS;

/// Environment-driven settings for consumers that do not want to hardcode
/// namespace or retry behavior.
#[derive(Envconfig, Clone, Debug)]
pub struct ClientConfig {
    /// Namespace the support archives live in.
    /// Env: SUPPORT_ARCHIVE_NAMESPACE
    #[envconfig(from = "SUPPORT_ARCHIVE_NAMESPACE", default = "default")]
    pub namespace: String,

    /// Upper bound on conflict retries for status updates.
    /// Env: SUPPORT_ARCHIVE_MAX_CONFLICT_RETRIES
    #[envconfig(from = "SUPPORT_ARCHIVE_MAX_CONFLICT_RETRIES", default = "20")]
    pub max_conflict_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            max_conflict_retries: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
