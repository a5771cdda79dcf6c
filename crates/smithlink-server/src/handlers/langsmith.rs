//! LangSmith integration HTTP handlers.
//!
//! Each handler makes exactly one service call through [`delegate`], which
//! logs failures and maps them to the operation's fixed 500 response.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use smithlink_core::{ApiKeyConfig, IntegrationError};
use tracing::{error, info};

use crate::dto::{
    ConfigResponse, CreateProjectRequest, ProjectResponse, ProjectsResponse, RunResponse,
    RunsResponse, SaveApiKeysRequest, SuccessResponse, TestConnectionRequest, ToggleRequest,
    TraceResponse,
};
use crate::error::{AppError, Operation};
use crate::extract::{RunLimit, ValidatedJson};
use crate::AppState;

async fn delegate<T>(
    op: Operation,
    call: impl Future<Output = Result<T, IntegrationError>>,
) -> Result<T, AppError> {
    call.await.map_err(|e| {
        error!("[LangSmith] Error {}: {:?}", op.action(), e);
        AppError::Operation(op)
    })
}

/// POST /api-keys/{workspace_id}
pub async fn save_api_keys(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    ValidatedJson(req): ValidatedJson<SaveApiKeysRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    info!("Saving LangSmith API keys for workspace {}", workspace_id);
    let config = ApiKeyConfig::new(req.api_key, req.api_url);

    delegate(
        Operation::SaveApiKeys,
        state.service.save_api_keys(&workspace_id, config),
    )
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api-keys/{workspace_id}
pub async fn get_api_keys(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<ConfigResponse>, AppError> {
    let config = delegate(
        Operation::GetApiKeys,
        state.service.get_api_keys(&workspace_id),
    )
    .await?;

    Ok(Json(ConfigResponse { config }))
}

/// PUT /toggle/{workspace_id}
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ToggleRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    info!(
        "Setting LangSmith enabled={} for workspace {}",
        req.enabled, workspace_id
    );

    delegate(
        Operation::ToggleEnabled,
        state.service.toggle_enabled(&workspace_id, req.enabled),
    )
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /test-connection
pub async fn test_connection(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TestConnectionRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let api_url = req.api_url.as_deref().unwrap_or(&state.default_api_url);

    let success = delegate(
        Operation::TestConnection,
        state.service.test_connection(&req.api_key, api_url),
    )
    .await?;

    Ok(Json(SuccessResponse { success }))
}

/// GET /projects/{workspace_id}
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
) -> Result<Json<ProjectsResponse>, AppError> {
    let projects = delegate(
        Operation::ListProjects,
        state.service.list_projects(&workspace_id),
    )
    .await?;

    Ok(Json(ProjectsResponse { projects }))
}

/// POST /projects/{workspace_id}
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    info!(
        "Creating LangSmith project '{}' for workspace {}",
        req.name, workspace_id
    );

    let project = delegate(
        Operation::CreateProject,
        state
            .service
            .create_project(&workspace_id, &req.name, req.description.as_deref()),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}

/// GET /projects/{workspace_id}/{project_id}/runs
pub async fn get_runs(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, project_id)): Path<(String, String)>,
    RunLimit(limit): RunLimit,
) -> Result<Json<RunsResponse>, AppError> {
    let runs = delegate(
        Operation::GetRuns,
        state.service.get_runs(&workspace_id, &project_id, limit),
    )
    .await?;

    Ok(Json(RunsResponse { runs }))
}

/// GET /runs/{workspace_id}/{run_id}
pub async fn get_run_details(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, run_id)): Path<(String, String)>,
) -> Result<Json<RunResponse>, AppError> {
    let run = delegate(
        Operation::GetRunDetails,
        state.service.get_run_details(&workspace_id, &run_id),
    )
    .await?;

    Ok(Json(RunResponse { run }))
}

/// GET /traces/{workspace_id}/{run_id}
pub async fn get_run_trace(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, run_id)): Path<(String, String)>,
) -> Result<Json<TraceResponse>, AppError> {
    let trace = delegate(
        Operation::GetRunTrace,
        state.service.get_run_trace(&workspace_id, &run_id),
    )
    .await?;

    Ok(Json(TraceResponse { trace }))
}
