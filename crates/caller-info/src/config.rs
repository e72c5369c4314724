//! Lookup client configuration
//!
//! One user-overridable preference: the API base URL. Persisted as a small
//! JSON file at a caller-supplied path; a missing or unreadable file falls
//! back to the default, never fails the caller.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{LookupError, Result};

/// Default lookup service base URL.
pub const DEFAULT_BASE_URL: &str = "https://flyvendo.com/ct";

/// Configuration for [`CallerInfoClient`](crate::client::CallerInfoClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL the endpoint path is appended to.
    pub base_url: Url,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            // Compile-time constant, always parses.
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

impl LookupConfig {
    /// Build a config with an explicit base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LookupError::Config(format!("invalid base URL {base_url}: {e}")))?;
        Ok(Self { base_url })
    }

    /// Load from a JSON preference file, falling back to the default when
    /// the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("loaded lookup config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("malformed lookup config at {}: {}, using default", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist to a JSON preference file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LookupError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| LookupError::Config(format!("failed to write {}: {e}", path.display())))
    }
}
