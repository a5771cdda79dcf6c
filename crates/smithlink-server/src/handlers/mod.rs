//! HTTP route handlers for the integration server.

pub mod langsmith;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
