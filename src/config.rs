//! Client configuration.

use crate::curator::CURATOR_BASE_URL;

/// Environment variable that overrides the backend base URL.
pub const BASE_URL_ENV: &str = "DOCENT_BACKEND_URL";

/// Runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Curator backend.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: CURATOR_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(std::env::var(BASE_URL_ENV).ok())
    }

    fn from_lookup(base_url: Option<String>) -> Self {
        match base_url {
            Some(url) if !url.trim().is_empty() => Self { base_url: url },
            _ => Self::default(),
        }
    }

    /// Override the base URL (builder pattern).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
