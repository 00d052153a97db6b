use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_OVERPASS_ENDPOINTS: &[&str] = &[
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://z.overpass-api.de/api/interpreter",
];

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

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
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "value is empty".to_string(),
            });
        }
        Ok(trimmed.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        parse_num(var, default)?
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_num(var, default)?
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_num(var, default)?
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_num(var, default)?
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_num(var, default)?
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("{value} is not a positive number")));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("MMDIR_ENV", "development"))?;
    let log_level = or_default("MMDIR_LOG_LEVEL", "info");

    let overpass_endpoints = parse_endpoints(&or_default(
        "MMDIR_OVERPASS_ENDPOINTS",
        &DEFAULT_OVERPASS_ENDPOINTS.join(","),
    ))?;
    let nominatim_url = or_default("MMDIR_NOMINATIM_URL", DEFAULT_NOMINATIM_URL);

    let request_timeout_secs = parse_u64("MMDIR_REQUEST_TIMEOUT_SECS", "60")?;
    let user_agent = or_default("MMDIR_USER_AGENT", "mmdir/0.1 (monastery-directory)");

    let min_zoom = parse_u8("MMDIR_MIN_ZOOM", "11")?;
    let min_move_meters = parse_positive_f64("MMDIR_MIN_MOVE_METERS", "600")?;
    let debounce_ms = parse_u64("MMDIR_DEBOUNCE_MS", "1600")?;

    let cache_ttl_secs = parse_u64("MMDIR_CACHE_TTL_SECS", "180")?;
    let cache_capacity = parse_usize("MMDIR_CACHE_CAPACITY", "256")?;
    if cache_capacity == 0 {
        return Err(invalid(
            "MMDIR_CACHE_CAPACITY",
            "capacity must be at least 1".to_string(),
        ));
    }

    let backoff_base_ms = parse_u64("MMDIR_BACKOFF_BASE_MS", "5000")?;
    let backoff_factor = parse_positive_f64("MMDIR_BACKOFF_FACTOR", "1.6")?;
    let backoff_cap_ms = parse_u64("MMDIR_BACKOFF_CAP_MS", "15000")?;
    let backoff_jitter_ms = parse_u64("MMDIR_BACKOFF_JITTER_MS", "250")?;
    let rate_limit_cooldown_ms = parse_u64("MMDIR_RATE_LIMIT_COOLDOWN_MS", "8000")?;
    let max_rate_limit_retries = match lookup("MMDIR_MAX_RATE_LIMIT_RETRIES") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<u32>()
                .map_err(|e| invalid("MMDIR_MAX_RATE_LIMIT_RETRIES", e.to_string()))?,
        ),
        _ => None,
    };

    let viewport_query_timeout_secs = parse_u32("MMDIR_VIEWPORT_QUERY_TIMEOUT_SECS", "25")?;
    let nationwide_query_timeout_secs = parse_u32("MMDIR_NATIONWIDE_QUERY_TIMEOUT_SECS", "30")?;
    let nationwide_limit = parse_usize("MMDIR_NATIONWIDE_LIMIT", "250")?;
    let geocode_radius_deg = parse_positive_f64("MMDIR_GEOCODE_RADIUS_DEG", "0.08")?;

    let events_path = PathBuf::from(or_default("MMDIR_EVENTS_PATH", "./events-mm.json"));
    let overrides_path = lookup("MMDIR_OVERRIDES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    Ok(AppConfig {
        env,
        log_level,
        overpass_endpoints,
        nominatim_url,
        request_timeout_secs,
        user_agent,
        min_zoom,
        min_move_meters,
        debounce_ms,
        cache_ttl_secs,
        cache_capacity,
        backoff_base_ms,
        backoff_factor,
        backoff_cap_ms,
        backoff_jitter_ms,
        rate_limit_cooldown_ms,
        max_rate_limit_retries,
        viewport_query_timeout_secs,
        nationwide_query_timeout_secs,
        nationwide_limit,
        geocode_radius_deg,
        events_path,
        overrides_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MMDIR_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Split a comma-separated endpoint list, dropping blanks.
fn parse_endpoints(raw: &str) -> Result<Vec<String>, ConfigError> {
    let endpoints: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if endpoints.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "MMDIR_OVERPASS_ENDPOINTS".to_string(),
            reason: "at least one endpoint is required".to_string(),
        });
    }
    Ok(endpoints)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
