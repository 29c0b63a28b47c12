//! Environment variable helpers shared by the `from_env` constructors.
//!
//! Unset variables fall back to the default silently; set but unparsable
//! values fall back too, with a warning naming the variable.

use std::str::FromStr;
use std::time::Duration;

pub fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

pub fn env_duration_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(name, default.as_secs()))
}

/// Comma-separated list with blanks dropped.
pub fn env_list(name: &str, default: &str) -> Vec<String> {
    env_string(name, default)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
