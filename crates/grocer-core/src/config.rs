use crate::app_config::{AppConfig, Environment, OutputFormat};
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
/// Every variable has a default, so only malformed values fail. Decoupled from
/// the process environment so tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let env = parse_environment(&or_default("GROCER_ENV", "development"));
    let log_level = or_default("GROCER_LOG_LEVEL", "info");
    let retailers_path = PathBuf::from(or_default(
        "GROCER_RETAILERS_PATH",
        "./config/retailers.yaml",
    ));
    let output_path = PathBuf::from(or_default("GROCER_OUTPUT_PATH", "./products.csv"));
    let output_format = or_default("GROCER_OUTPUT_FORMAT", "csv")
        .parse::<OutputFormat>()
        .map_err(|reason| invalid("GROCER_OUTPUT_FORMAT", reason))?;

    let scraper_request_timeout_secs = parse_u64("GROCER_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "GROCER_SCRAPER_USER_AGENT",
        "grocer/0.1 (catalog-collector)",
    );
    let scraper_max_concurrent_retailers =
        parse_usize("GROCER_SCRAPER_MAX_CONCURRENT_RETAILERS", "1")?;
    if scraper_max_concurrent_retailers == 0 {
        return Err(invalid(
            "GROCER_SCRAPER_MAX_CONCURRENT_RETAILERS",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_inter_request_delay_ms = parse_u64("GROCER_SCRAPER_INTER_REQUEST_DELAY_MS", "0")?;
    let scraper_max_retries = parse_u32("GROCER_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("GROCER_SCRAPER_RETRY_BACKOFF_BASE_SECS", "2")?;

    let webdriver_url = lookup("GROCER_WEBDRIVER_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(AppConfig {
        env,
        log_level,
        retailers_path,
        output_path,
        output_format,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_concurrent_retailers,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        webdriver_url,
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
