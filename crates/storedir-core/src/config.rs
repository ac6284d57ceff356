use reqwest::Url;

use crate::app_config::{AppConfig, Environment};
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
/// Every variable has a local-development fallback, so an empty environment
/// yields a config pointed at `localhost`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_url = |var: &str, default: &str| -> Result<Url, ConfigError> {
        let raw = or_default(var, default);
        let url = Url::parse(raw.trim()).map_err(|e| invalid(var, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(var, format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(url)
    };

    let env = parse_environment(&or_default("STOREDIR_ENV", "development"));

    let bind_addr = or_default("STOREDIR_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("STOREDIR_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("STOREDIR_LOG_LEVEL", "info");

    let api_base_url = parse_url("STOREDIR_API_BASE_URL", "http://localhost:4000")?;
    let site_url = parse_url("STOREDIR_SITE_URL", "http://localhost:3000")?;

    let auth_cookie_name = or_default("STOREDIR_AUTH_COOKIE_NAME", "token");
    if auth_cookie_name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ';' | '=' | ','))
    {
        return Err(invalid(
            "STOREDIR_AUTH_COOKIE_NAME",
            format!("'{auth_cookie_name}' is not a valid cookie name"),
        ));
    }

    let auth_cookie_max_age_days = or_default("STOREDIR_AUTH_COOKIE_MAX_AGE_DAYS", "7")
        .parse::<i64>()
        .map_err(|e| invalid("STOREDIR_AUTH_COOKIE_MAX_AGE_DAYS", e.to_string()))?;
    if auth_cookie_max_age_days <= 0 {
        return Err(invalid(
            "STOREDIR_AUTH_COOKIE_MAX_AGE_DAYS",
            "must be at least 1".to_string(),
        ));
    }

    let upstream_timeout_secs = match lookup("STOREDIR_UPSTREAM_TIMEOUT_SECS") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("STOREDIR_UPSTREAM_TIMEOUT_SECS", e.to_string()))?,
        ),
        _ => None,
    };

    let user_agent = or_default("STOREDIR_USER_AGENT", "storedir-bff/0.1");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        api_base_url,
        site_url,
        auth_cookie_name,
        auth_cookie_max_age_days,
        upstream_timeout_secs,
        user_agent,
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
