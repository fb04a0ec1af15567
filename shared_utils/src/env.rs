use std::str::FromStr;

use crate::config::ConfigError;

/// Reads an optional environment variable. Unset and blank values both map to `None`.
pub fn get_env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset, and
/// [`ConfigError::InvalidEnvVar`] when it is set but does not parse as `T`.
pub fn parse_env_opt<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match get_env_opt(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value: raw,
            }),
    }
}
