//! HTTP surface for the LangSmith integration.
//!
//! [`router`] builds a mountable `Router` (e.g. nested at `/langsmith`) from
//! an injected [`IntegrationService`] and [`Authenticator`].

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use smithlink_core::{IntegrationService, DEFAULT_API_URL};

pub use auth::{AuthError, AuthUser, Authenticator, TokenAuthenticator};
pub use error::{AppError, Operation};

use handlers::langsmith;

pub struct AppState {
    pub service: Arc<dyn IntegrationService>,
    pub auth: Arc<dyn Authenticator>,
    /// Fallback for `test-connection` requests that omit `api_url`.
    pub default_api_url: String,
}

impl AppState {
    pub fn new(service: Arc<dyn IntegrationService>, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            auth,
            default_api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_default_api_url(mut self, url: impl Into<String>) -> Self {
        self.default_api_url = url.into();
        self
    }
}

/// Builds the integration router.
///
/// `validate_user` wraps every route; `check_workspace_auth` additionally
/// wraps every route carrying a `{workspace_id}` segment.
pub fn router(state: Arc<AppState>) -> Router {
    let workspace_routes = Router::new()
        .route(
            "/api-keys/{workspace_id}",
            post(langsmith::save_api_keys).get(langsmith::get_api_keys),
        )
        .route("/toggle/{workspace_id}", put(langsmith::toggle))
        .route(
            "/projects/{workspace_id}",
            get(langsmith::list_projects).post(langsmith::create_project),
        )
        .route(
            "/projects/{workspace_id}/{project_id}/runs",
            get(langsmith::get_runs),
        )
        .route("/runs/{workspace_id}/{run_id}", get(langsmith::get_run_details))
        .route("/traces/{workspace_id}/{run_id}", get(langsmith::get_run_trace))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::check_workspace_auth,
        ));

    Router::new()
        .route("/test-connection", post(langsmith::test_connection))
        .merge(workspace_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::validate_user,
        ))
        .with_state(state)
}
