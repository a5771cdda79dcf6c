//! Authentication and workspace authorization middleware.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use smithlink_config::AccessList;
use thiserror::Error;
use tracing::warn;

use crate::error::AppError;
use crate::AppState;

/// The caller established by `validate_user`, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingCredentials,
    #[error("unknown token")]
    InvalidToken,
    #[error("user {user_id} may not access workspace {workspace_id}")]
    WorkspaceDenied { user_id: String, workspace_id: String },
}

/// Host-supplied authentication and authorization.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn validate_user(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError>;

    async fn check_workspace_access(
        &self,
        user: &AuthUser,
        workspace_id: &str,
    ) -> Result<(), AuthError>;
}

/// Runs on every route; halts with 401 before any handler runs.
pub async fn validate_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = state.auth.validate_user(req.headers()).await.map_err(|e| {
        warn!("Rejected unauthenticated request to {}: {}", req.uri().path(), e);
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Runs on workspace-scoped routes after `validate_user`; halts with 403.
pub async fn check_workspace_auth(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    let workspace_id = params.get("workspace_id").ok_or(AppError::Forbidden)?;

    state
        .auth
        .check_workspace_access(&user, workspace_id)
        .await
        .map_err(|e| {
            warn!("Workspace authorization failed: {}", e);
            AppError::Forbidden
        })?;

    Ok(next.run(req).await)
}

/// Bearer-token authenticator backed by a static access list.
pub struct TokenAuthenticator {
    users: HashMap<String, String>,
    workspaces: HashMap<String, HashSet<String>>,
}

impl TokenAuthenticator {
    pub fn new(access: &AccessList) -> Self {
        let mut users = HashMap::new();
        let mut workspaces: HashMap<String, HashSet<String>> = HashMap::new();
        for entry in access.entries() {
            users.insert(entry.token.clone(), entry.user_id.clone());
            workspaces
                .entry(entry.user_id.clone())
                .or_default()
                .extend(entry.workspaces.iter().cloned());
        }
        Self { users, workspaces }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn validate_user(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingCredentials)?;
        let user_id = self.users.get(token).ok_or(AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id: user_id.clone(),
        })
    }

    async fn check_workspace_access(
        &self,
        user: &AuthUser,
        workspace_id: &str,
    ) -> Result<(), AuthError> {
        let allowed = self
            .workspaces
            .get(&user.user_id)
            .is_some_and(|ws| ws.contains(workspace_id));
        if !allowed {
            return Err(AuthError::WorkspaceDenied {
                user_id: user.user_id.clone(),
                workspace_id: workspace_id.to_string(),
            });
        }
        Ok(())
    }
}
