//! Core types and the integration service contract for smithlink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public LangSmith endpoint used when a request or workspace omits `api_url`.
pub const DEFAULT_API_URL: &str = "https://api.smith.langchain.com";

/// Number of runs returned when a caller does not specify a limit.
pub const DEFAULT_RUN_LIMIT: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("LangSmith is not configured for workspace {0}")]
    NotConfigured(String),

    #[error("LangSmith API error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Failed to parse LangSmith response: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for IntegrationError {
    fn from(err: serde_json::Error) -> Self {
        IntegrationError::Parse(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Per-workspace LangSmith credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl ApiKeyConfig {
    pub fn new(api_key: impl Into<String>, api_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url,
        }
    }

    /// Returns the configured URL, falling back to the public endpoint.
    pub fn resolved_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

/// A LangSmith project (a "session" in the remote API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
}

/// A single recorded execution in LangSmith.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub outputs: serde_json::Value,
    #[serde(default)]
    pub feedback_stats: serde_json::Value,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub parent_run_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Every run belonging to the trace of a given run, ordered by start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: String,
    pub root_run_id: String,
    pub runs: Vec<Run>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Operations the integration router delegates to.
///
/// Implementations own credential persistence, the per-workspace enabled
/// flag, and all outbound calls to LangSmith. The router calls exactly one
/// method per request and never retries.
#[async_trait]
pub trait IntegrationService: Send + Sync {
    async fn save_api_keys(
        &self,
        workspace_id: &str,
        config: ApiKeyConfig,
    ) -> Result<(), IntegrationError>;

    async fn get_api_keys(&self, workspace_id: &str)
        -> Result<Option<ApiKeyConfig>, IntegrationError>;

    async fn toggle_enabled(&self, workspace_id: &str, enabled: bool)
        -> Result<(), IntegrationError>;

    async fn test_connection(&self, api_key: &str, api_url: &str) -> Result<bool, IntegrationError>;

    async fn list_projects(&self, workspace_id: &str) -> Result<Vec<Project>, IntegrationError>;

    async fn create_project(
        &self,
        workspace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, IntegrationError>;

    async fn get_runs(
        &self,
        workspace_id: &str,
        project_id: &str,
        limit: u32,
    ) -> Result<Vec<Run>, IntegrationError>;

    async fn get_run_details(&self, workspace_id: &str, run_id: &str)
        -> Result<Run, IntegrationError>;

    async fn get_run_trace(&self, workspace_id: &str, run_id: &str)
        -> Result<Trace, IntegrationError>;
}
