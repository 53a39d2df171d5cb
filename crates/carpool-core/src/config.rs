use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org/";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "carpool-board/0.1 (community ride-share)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CARPOOL_ENV", "development"))?;
    let bind_addr = parse_addr("CARPOOL_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CARPOOL_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CARPOOL_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CARPOOL_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CARPOOL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let geocoder_base_url = or_default("CARPOOL_GEOCODER_BASE_URL", DEFAULT_GEOCODER_BASE_URL);
    let geocoder_user_agent =
        or_default("CARPOOL_GEOCODER_USER_AGENT", DEFAULT_GEOCODER_USER_AGENT);
    if geocoder_user_agent.trim().is_empty() {
        return Err(invalid(
            "CARPOOL_GEOCODER_USER_AGENT",
            "the geocoding provider requires an identifying user agent".to_string(),
        ));
    }
    let geocoder_timeout_secs = parse_u64("CARPOOL_GEOCODER_TIMEOUT_SECS", "10")?;
    let geocoder_max_attempts = parse_u32("CARPOOL_GEOCODER_MAX_ATTEMPTS", "3")?;
    if geocoder_max_attempts == 0 {
        return Err(invalid(
            "CARPOOL_GEOCODER_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let geocoder_backoff_base_ms = parse_u64("CARPOOL_GEOCODER_BACKOFF_BASE_MS", "1000")?;
    let geocoder_country_codes = or_default("CARPOOL_GEOCODER_COUNTRY_CODES", "de");

    let write_rate_limit = parse_usize("CARPOOL_WRITE_RATE_LIMIT", "5")?;
    let write_rate_window_secs = parse_u64("CARPOOL_WRITE_RATE_WINDOW_SECS", "3600")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        geocoder_base_url,
        geocoder_user_agent,
        geocoder_timeout_secs,
        geocoder_max_attempts,
        geocoder_backoff_base_ms,
        geocoder_country_codes,
        write_rate_limit,
        write_rate_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CARPOOL_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
