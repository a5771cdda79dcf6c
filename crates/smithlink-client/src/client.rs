//! HTTP client for the LangSmith sessions and runs endpoints.

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smithlink_core::{Project, Run, Trace};
use tracing::{debug, info};

use crate::ClientError;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize, Default)]
struct RunsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct RunsPage {
    #[serde(default)]
    runs: Vec<Run>,
}

/// Client for a single LangSmith API key and endpoint.
#[derive(Clone)]
pub struct LangSmithClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl LangSmithClient {
    /// Creates a client with its own connection pool.
    pub fn new(api_key: &str, api_url: &str) -> Self {
        Self::with_http(Client::new(), api_key, api_url)
    }

    /// Creates a client that shares an existing `reqwest::Client`.
    pub fn with_http(client: Client, api_key: &str, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Checks that the key is accepted by listing at most one project.
    ///
    /// Any HTTP response is an answer; only transport failures are errors.
    pub async fn ping(&self) -> Result<bool, ClientError> {
        let response = self
            .client
            .get(self.url("/api/v1/sessions"))
            .query(&[("limit", "1")])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        debug!("LangSmith ping {} -> {}", self.api_url, status);
        Ok(status.is_success())
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.send(self.client.get(self.url("/api/v1/sessions"))).await
    }

    /// Looks a project up by exact name using the server-side filter.
    pub async fn find_project(&self, name: &str) -> Result<Option<Project>, ClientError> {
        let matches: Vec<Project> = self
            .send(
                self.client
                    .get(self.url("/api/v1/sessions"))
                    .query(&[("name", name)]),
            )
            .await?;
        Ok(matches.into_iter().find(|p| p.name == name))
    }

    /// Returns the project with `name`, creating it only if none exists.
    ///
    /// A missing or empty description is replaced with a creation note.
    pub async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, ClientError> {
        if let Some(project) = self.find_project(name).await? {
            info!("Project '{}' already exists with ID: {}", name, project.id);
            return Ok(project);
        }

        let description = match description.filter(|d| !d.is_empty()) {
            Some(d) => d.to_string(),
            None => format!("Created by smithlink on {}", Utc::now().to_rfc3339()),
        };
        let body = CreateProjectRequest {
            name,
            description: &description,
        };
        let project: Project = self
            .send(self.client.post(self.url("/api/v1/sessions")).json(&body))
            .await?;
        info!("Created LangSmith project: {} with ID: {}", name, project.id);
        Ok(project)
    }

    pub async fn list_runs(&self, project_id: &str, limit: u32) -> Result<Vec<Run>, ClientError> {
        let query = RunsQuery {
            session: Some(vec![project_id]),
            limit: Some(limit),
            ..Default::default()
        };
        let page: RunsPage = self
            .send(self.client.post(self.url("/api/v1/runs/query")).json(&query))
            .await?;
        Ok(page.runs)
    }

    pub async fn read_run(&self, run_id: &str) -> Result<Run, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/v1/runs/{}", run_id))))
            .await
    }

    /// Fetches every run that shares a trace with `run_id`.
    pub async fn read_trace(&self, run_id: &str) -> Result<Trace, ClientError> {
        let run = self.read_run(run_id).await?;
        let trace_id = run.trace_id.clone().unwrap_or_else(|| run.id.clone());

        let query = RunsQuery {
            trace: Some(trace_id.as_str()),
            ..Default::default()
        };
        let page: RunsPage = self
            .send(self.client.post(self.url("/api/v1/runs/query")).json(&query))
            .await?;

        let mut runs = page.runs;
        if runs.is_empty() {
            runs.push(run);
        }
        runs.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        let root_run_id = runs
            .iter()
            .find(|r| r.parent_run_id.is_none())
            .map(|r| r.id.clone())
            .unwrap_or_else(|| trace_id.clone());

        Ok(Trace {
            trace_id,
            root_run_id,
            runs,
        })
    }
}
