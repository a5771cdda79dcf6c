//! Default `IntegrationService`: credentials in SQLite, data from LangSmith.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use smithlink_client::LangSmithClient;
use smithlink_core::{
    ApiKeyConfig, IntegrationError, IntegrationService, Project, Run, Trace, DEFAULT_API_URL,
};
use smithlink_store::{SettingsStore, StoreError};
use tracing::info;

pub struct LangSmithIntegrationService {
    store: Arc<SettingsStore>,
    http: Client,
    default_api_url: String,
}

impl LangSmithIntegrationService {
    pub fn new(store: Arc<SettingsStore>, http: Client) -> Self {
        Self {
            store,
            http,
            default_api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Overrides the endpoint used for workspaces saved without `api_url`.
    pub fn with_default_api_url(mut self, url: impl Into<String>) -> Self {
        self.default_api_url = url.into();
        self
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, IntegrationError>
    where
        F: FnOnce(&SettingsStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| IntegrationError::Internal(e.to_string()))?
            .map_err(Into::into)
    }

    async fn client_for(&self, workspace_id: &str) -> Result<LangSmithClient, IntegrationError> {
        let ws = workspace_id.to_string();
        let config = self
            .with_store(move |s| s.get_api_keys(&ws))
            .await?
            .ok_or_else(|| IntegrationError::NotConfigured(workspace_id.to_string()))?;

        let api_url = config.api_url.as_deref().unwrap_or(&self.default_api_url);
        Ok(LangSmithClient::with_http(self.http.clone(), &config.api_key, api_url))
    }
}

#[async_trait]
impl IntegrationService for LangSmithIntegrationService {
    async fn save_api_keys(
        &self,
        workspace_id: &str,
        config: ApiKeyConfig,
    ) -> Result<(), IntegrationError> {
        let ws = workspace_id.to_string();
        self.with_store(move |s| s.save_api_keys(&ws, &config)).await?;
        info!("Saved LangSmith API keys for workspace {}", workspace_id);
        Ok(())
    }

    async fn get_api_keys(
        &self,
        workspace_id: &str,
    ) -> Result<Option<ApiKeyConfig>, IntegrationError> {
        let ws = workspace_id.to_string();
        self.with_store(move |s| s.get_api_keys(&ws)).await
    }

    async fn toggle_enabled(&self, workspace_id: &str, enabled: bool) -> Result<(), IntegrationError> {
        let ws = workspace_id.to_string();
        self.with_store(move |s| s.set_enabled(&ws, enabled)).await?;
        info!("LangSmith integration for workspace {} enabled={}", workspace_id, enabled);
        Ok(())
    }

    async fn test_connection(&self, api_key: &str, api_url: &str) -> Result<bool, IntegrationError> {
        let client = LangSmithClient::with_http(self.http.clone(), api_key, api_url);
        Ok(client.ping().await?)
    }

    async fn list_projects(&self, workspace_id: &str) -> Result<Vec<Project>, IntegrationError> {
        let client = self.client_for(workspace_id).await?;
        Ok(client.list_projects().await?)
    }

    async fn create_project(
        &self,
        workspace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, IntegrationError> {
        let client = self.client_for(workspace_id).await?;
        Ok(client.create_project(name, description).await?)
    }

    async fn get_runs(
        &self,
        workspace_id: &str,
        project_id: &str,
        limit: u32,
    ) -> Result<Vec<Run>, IntegrationError> {
        let client = self.client_for(workspace_id).await?;
        Ok(client.list_runs(project_id, limit).await?)
    }

    async fn get_run_details(&self, workspace_id: &str, run_id: &str) -> Result<Run, IntegrationError> {
        let client = self.client_for(workspace_id).await?;
        Ok(client.read_run(run_id).await?)
    }

    async fn get_run_trace(&self, workspace_id: &str, run_id: &str) -> Result<Trace, IntegrationError> {
        let client = self.client_for(workspace_id).await?;
        Ok(client.read_trace(run_id).await?)
    }
}
