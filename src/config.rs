//! Environment configuration
//!
//! Settings are read once in the binaries and passed down by value; nothing
//! here is global. The generation credential is optional by design: its
//! absence must not prevent startup or capability registration, only
//! generation-dependent operations fail.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the generation API credential
pub const API_KEY_VAR: &str = "CAPLINK_API_KEY";
/// Environment variable overriding the generation endpoint base URL
pub const API_BASE_VAR: &str = "CAPLINK_API_BASE";
/// Environment variable overriding the generation model
pub const MODEL_VAR: &str = "CAPLINK_MODEL";
/// Environment variable overriding the user store path
pub const DATA_PATH_VAR: &str = "CAPLINK_DATA";
/// Environment variable overriding the request timeout in milliseconds
pub const TIMEOUT_MS_VAR: &str = "CAPLINK_TIMEOUT_MS";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Runtime configuration shared by the host and driver binaries
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation API credential; None means generation-dependent
    /// operations fail while everything else works
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible chat completion endpoint
    pub api_base: String,
    /// Model requested from the generation backend
    pub model: String,
    /// Path of the user store document
    pub store_path: PathBuf,
    /// Bound on how long a pending call may wait
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment, applying defaults
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{API_KEY_VAR} is not set; generation-dependent operations will fail"
            );
        }

        let request_timeout = std::env::var(TIMEOUT_MS_VAR)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));

        Self {
            api_key,
            api_base: std::env::var(API_BASE_VAR)
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: std::env::var(MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            store_path: std::env::var(DATA_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_store_path()),
            request_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            store_path: default_store_path(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("caplink").join("users.json"))
        .unwrap_or_else(|| PathBuf::from("users.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert!(config.store_path.ends_with("users.json"));
    }
}
