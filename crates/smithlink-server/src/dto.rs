use serde::{Deserialize, Serialize};
use smithlink_core::{ApiKeyConfig, Project, Run, Trace};

use crate::extract::RequestBody;

// === Request DTOs ===

#[derive(Debug, Deserialize)]
pub struct SaveApiKeysRequest {
    pub api_key: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl RequestBody for SaveApiKeysRequest {
    const REQUIRED: &'static [&'static str] = &["api_key"];
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

impl RequestBody for ToggleRequest {
    const REQUIRED: &'static [&'static str] = &["enabled"];
}

#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    pub api_key: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl RequestBody for TestConnectionRequest {
    const REQUIRED: &'static [&'static str] = &["api_key"];
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl RequestBody for CreateProjectRequest {
    const REQUIRED: &'static [&'static str] = &["name"];
}

// === Response DTOs ===

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub config: Option<ApiKeyConfig>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct RunsResponse {
    pub runs: Vec<Run>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run: Run,
}

#[derive(Debug, Serialize)]
pub struct TraceResponse {
    pub trace: Trace,
}
