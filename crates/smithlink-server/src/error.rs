//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The nine delegated service calls, each with a fixed client-facing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveApiKeys,
    GetApiKeys,
    ToggleEnabled,
    TestConnection,
    ListProjects,
    CreateProject,
    GetRuns,
    GetRunDetails,
    GetRunTrace,
}

impl Operation {
    /// Action phrase used in `[LangSmith] Error <action>:` log lines.
    pub fn action(self) -> &'static str {
        match self {
            Operation::SaveApiKeys => "saving API keys",
            Operation::GetApiKeys => "getting API keys",
            Operation::ToggleEnabled => "toggling status",
            Operation::TestConnection => "testing connection",
            Operation::ListProjects => "listing projects",
            Operation::CreateProject => "creating project",
            Operation::GetRuns => "getting runs",
            Operation::GetRunDetails => "getting run details",
            Operation::GetRunTrace => "getting run trace",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::SaveApiKeys => "Failed to save LangSmith API keys",
            Operation::GetApiKeys => "Failed to get LangSmith API keys",
            Operation::ToggleEnabled => "Failed to toggle LangSmith status",
            Operation::TestConnection => "Failed to test LangSmith connection",
            Operation::ListProjects => "Failed to list LangSmith projects",
            Operation::CreateProject => "Failed to create LangSmith project",
            Operation::GetRuns => "Failed to get LangSmith runs",
            Operation::GetRunDetails => "Failed to get LangSmith run details",
            Operation::GetRunTrace => "Failed to get LangSmith run trace",
        }
    }
}

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// A service call failed; the cause has already been logged.
    Operation(Operation),
    BadRequest(String),
    Unauthorized,
    Forbidden,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Operation(op) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                op.failure_message().to_string(),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
