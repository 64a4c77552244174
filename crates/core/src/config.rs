//! Session Configuration
//!
//! Holds the credentials and identifiers needed to open a voice-agent session.
//! A missing key or assistant id is not a load failure: the bridge reports it
//! through the session snapshot, so `from_env` only fails on malformed values.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Immutable per-session configuration.
pub struct SessionConfig {
    api_key: SecretString,
    pub assistant_id: String,
    pub server_url: Option<String>,
}

impl SessionConfig {
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            api_key: SecretString::from(api_key),
            assistant_id: assistant_id.into(),
            server_url: None,
        }
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        let url = server_url.into();
        self.server_url = (!url.is_empty()).then_some(url);
        self
    }

    /// The credential token handed to the client factory.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key().is_empty()
    }

    pub fn has_assistant_id(&self) -> bool {
        !self.assistant_id.is_empty()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_key", &if self.has_api_key() { "[REDACTED]" } else { "" })
            .field("assistant_id", &self.assistant_id)
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Everything the console loads from the environment at startup.
#[derive(Debug)]
pub struct EnvConfig {
    pub session: SessionConfig,
    pub log_level: Level,
}

impl EnvConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_key = std::env::var("VAPI_API_KEY").unwrap_or_default();
        let assistant_id = std::env::var("VAPI_ASSISTANT_ID").unwrap_or_default();

        let server_url = match std::env::var("VAPI_SERVER_URL") {
            Ok(url) if !url.is_empty() => Some(validate_server_url(&url)?),
            _ => None,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let mut session = SessionConfig::new(api_key, assistant_id);
        session.server_url = server_url;

        Ok(Self { session, log_level })
    }
}

/// Accepts only URLs with an http(s) or ws(s) scheme.
pub fn validate_server_url(url: &str) -> Result<String, ConfigError> {
    const SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];
    let has_host = SCHEMES
        .iter()
        .find_map(|s| url.strip_prefix(s))
        .is_some_and(|rest| !rest.is_empty());
    if has_host {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidValue(
            "VAPI_SERVER_URL".to_string(),
            format!("'{}' is not an http(s) or ws(s) URL", url),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("VAPI_API_KEY");
            env::remove_var("VAPI_ASSISTANT_ID");
            env::remove_var("VAPI_SERVER_URL");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SessionConfig::new("sk-very-secret", "asst_1");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("asst_1"));
    }

    #[test]
    fn test_empty_server_url_is_absent() {
        let config = SessionConfig::new("key", "asst").with_server_url("");
        assert_eq!(config.server_url, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = EnvConfig::from_env().expect("Config should load without any variables");

        assert!(!config.session.has_api_key());
        assert!(!config.session.has_assistant_id());
        assert_eq!(config.session.server_url, None);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("VAPI_API_KEY", "pk-test");
            env::set_var("VAPI_ASSISTANT_ID", "asst_42");
            env::set_var("VAPI_SERVER_URL", "https://api.example.com");
            env::set_var("RUST_LOG", "debug");
        }

        let config = EnvConfig::from_env().expect("Config should load successfully");

        assert_eq!(config.session.api_key(), "pk-test");
        assert_eq!(config.session.assistant_id, "asst_42");
        assert_eq!(
            config.session.server_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_invalid_server_url() {
        clear_env_vars();
        unsafe {
            env::set_var("VAPI_SERVER_URL", "ftp://nope");
        }

        let err = EnvConfig::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "VAPI_SERVER_URL"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = EnvConfig::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }
    }

    #[test]
    fn test_validate_server_url_requires_host() {
        assert!(validate_server_url("wss://").is_err());
        assert!(validate_server_url("ws://localhost:8080").is_ok());
    }
}
