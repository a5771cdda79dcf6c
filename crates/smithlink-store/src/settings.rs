use smithlink_core::ApiKeyConfig;

/// Stored integration state for one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub workspace_id: String,
    /// Empty until keys are saved; a toggle alone creates the row.
    pub api_key: String,
    pub api_url: Option<String>,
    pub enabled: bool,
    /// Unix timestamp (milliseconds) of the last write.
    pub updated_at: i64,
}

impl WorkspaceSettings {
    /// Returns the saved credentials, if any have been stored.
    pub fn api_key_config(&self) -> Option<ApiKeyConfig> {
        if self.api_key.is_empty() {
            return None;
        }
        Some(ApiKeyConfig::new(self.api_key.clone(), self.api_url.clone()))
    }
}
