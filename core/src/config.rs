//! Client configuration.
//!
//! [`ClientConfig::resolve`] picks the source: an explicit TOML file when one
//! is given, otherwise the `BASE_URL` environment variable, otherwise
//! [`DEFAULT_BASE_URL`]. A file that omits `base_url` gets the default.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RosterError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const BASE_URL_ENV: &str = "BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read `BASE_URL`, falling back to the default when unset or blank.
    pub fn from_env() -> Self {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| RosterError::Config(e.to_string()))
    }

    /// File first, then environment, then default.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::from_env()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RosterError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
