//! Process configuration read from the environment

use crate::render::Markup;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the document/QA service
    pub backend_url: String,
    pub port: u16,
    /// `None` waits for the QA service indefinitely
    pub ask_timeout: Option<Duration>,
    pub markup: Markup,
    /// Sessions unused this long are dropped; `None` keeps them until deleted
    pub session_idle: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            port: DEFAULT_PORT,
            ask_timeout: None,
            markup: Markup::Raw,
            session_idle: Some(DEFAULT_SESSION_IDLE),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("DOCCHAT_BACKEND_URL").filter(|u| !u.trim().is_empty()) {
            config.backend_url = url.trim().to_string();
        }

        if let Some(port) = lookup("DOCCHAT_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DOCCHAT_PORT",
                expected: "a port number",
                value: port.clone(),
            })?;
        }

        if let Some(secs) = lookup("DOCCHAT_ASK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DOCCHAT_ASK_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: secs.clone(),
            })?;
            config.ask_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(secs) = lookup("DOCCHAT_SESSION_IDLE_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DOCCHAT_SESSION_IDLE_SECS",
                expected: "a whole number of seconds",
                value: secs.clone(),
            })?;
            config.session_idle = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(flag) = lookup("DOCCHAT_ESCAPE_MARKUP") {
            if matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                config.markup = Markup::Escaped;
            }
        }

        Ok(config)
    }
}
