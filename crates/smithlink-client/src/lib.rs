//! LangSmith REST API client.

mod client;

pub use client::LangSmithClient;

use smithlink_core::IntegrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LangSmith API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ClientError> for IntegrationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => IntegrationError::Http(e.to_string()),
            ClientError::Api { status, body } => IntegrationError::Remote { status, body },
            ClientError::Decode(e) => IntegrationError::Parse(e.to_string()),
        }
    }
}
