//! Environment-driven settings.
//!
//! Only the API key is mandatory. Everything else has a default so the
//! binary can run with nothing but `YT_API_KEY` set.

use std::{env, fmt::Display, str::FromStr};

pub const API_KEY_VAR: &str = "YT_API_KEY";
pub const API_BASE_URL_VAR: &str = "YT_API_BASE_URL";
pub const YT_DLP_PATH_VAR: &str = "YT_DLP_PATH";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("a YouTube API key is required: pass one explicitly or set YT_API_KEY")]
    MissingApiKey,
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),
    #[error("{name} must be a number, got {value:?}: {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Returns the value only if it holds something other than whitespace.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn var(name: &str) -> Option<String> {
    non_empty(env::var(name).ok())
}

pub fn require_var(name: &'static str) -> Result<String, ConfigError> {
    var(name).ok_or(ConfigError::MissingVar(name))
}

pub fn api_key_from_env() -> Result<String, ConfigError> {
    var(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)
}

/// Reads a numeric variable, falling back to `default` when unset.
pub fn number_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_number(name, var(name).as_deref(), default)
}

fn parse_number<T>(name: &'static str, value: Option<&str>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidNumber {
            name,
            value: v.to_string(),
            reason: e.to_string(),
        }),
    }
}
