use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use smithlink_core::DEFAULT_API_URL;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Duplicate access token for user: {0}")]
    DuplicateToken(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Config
// ─────────────────────────────────────────────────────────────────────────────

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_PATH: &str = "data/smithlink.db";
const DEFAULT_ACCESS_FILE: &str = "access.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: String,
    pub db_path: String,
    pub access_file: String,
    pub default_api_url: String,
    /// Outbound request timeout for LangSmith calls. `None` leaves requests unbounded.
    pub http_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let http_timeout = match lookup("SMITHLINK_HTTP_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "SMITHLINK_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            addr: get("SMITHLINK_ADDR", DEFAULT_ADDR),
            db_path: get("SMITHLINK_DB", DEFAULT_DB_PATH),
            access_file: get("SMITHLINK_ACCESS_FILE", DEFAULT_ACCESS_FILE),
            default_api_url: get("LANGCHAIN_ENDPOINT", DEFAULT_API_URL),
            http_timeout,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access List
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub workspaces: Vec<String>,
}

/// Bearer tokens and the workspaces each user may operate on.
#[derive(Debug, Default)]
pub struct AccessList {
    entries: HashMap<String, AccessEntry>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<AccessEntry>) -> Result<Self, ConfigError> {
        let mut list = Self::new();
        for entry in entries {
            if list.entries.contains_key(&entry.token) {
                return Err(ConfigError::DuplicateToken(entry.user_id));
            }
            list.entries.insert(entry.token.clone(), entry);
        }
        Ok(list)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let entries: Vec<AccessEntry> = serde_json::from_str(&content)?;
        let list = Self::from_entries(entries)?;
        tracing::info!("Loaded {} access entries from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AccessEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
