use crate::app_config::{AppConfig, Environment, FailurePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PARKFIND_ENV", "development"));

    let bind_addr = or_default("PARKFIND_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PARKFIND_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("PARKFIND_LOG_LEVEL", "info");
    let providers_path = PathBuf::from(or_default(
        "PARKFIND_PROVIDERS_PATH",
        "./config/providers.yaml",
    ));
    let failure_policy = parse_failure_policy(&or_default("PARKFIND_FAILURE_POLICY", "lenient"))?;

    let provider_timeout_secs = parse_u64("PARKFIND_PROVIDER_TIMEOUT_SECS", "10")?;
    let provider_user_agent = or_default(
        "PARKFIND_PROVIDER_USER_AGENT",
        "parkfind/0.1 (parking-aggregator)",
    );
    let provider_max_retries = parse_u32("PARKFIND_PROVIDER_MAX_RETRIES", "2")?;
    let provider_retry_backoff_ms = parse_u64("PARKFIND_PROVIDER_RETRY_BACKOFF_MS", "250")?;

    let distance_timeout_ms = parse_u64("PARKFIND_DISTANCE_TIMEOUT_MS", "2000")?;
    let distance_max_concurrency = parse_usize("PARKFIND_DISTANCE_MAX_CONCURRENCY", "64")?;
    if distance_max_concurrency == 0 {
        return Err(invalid(
            "PARKFIND_DISTANCE_MAX_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        providers_path,
        failure_policy,
        provider_timeout_secs,
        provider_user_agent,
        provider_max_retries,
        provider_retry_backoff_ms,
        distance_timeout_ms,
        distance_max_concurrency,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_failure_policy(s: &str) -> Result<FailurePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "lenient" => Ok(FailurePolicy::Lenient),
        "strict" => Ok(FailurePolicy::Strict),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARKFIND_FAILURE_POLICY".to_string(),
            reason: format!("expected 'lenient' or 'strict', got '{other}'"),
        }),
    }
}
