use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the aggregation pipeline reacts when a step has nothing to work with:
/// no provider covers the point, no client supports the provider, or the
/// provider fetch fails.
///
/// The same policy applies to all three conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and return an empty result list.
    #[default]
    Lenient,
    /// Surface the condition as an error to the caller.
    Strict,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Lenient => write!(f, "lenient"),
            FailurePolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub providers_path: PathBuf,
    pub failure_policy: FailurePolicy,
    pub provider_timeout_secs: u64,
    pub provider_user_agent: String,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_ms: u64,
    pub distance_timeout_ms: u64,
    pub distance_max_concurrency: usize,
}
