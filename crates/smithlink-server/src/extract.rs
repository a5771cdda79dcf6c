//! Request guards that run before any handler body.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use smithlink_core::DEFAULT_RUN_LIMIT;
use tracing::debug;

use crate::error::AppError;

const INVALID_BODY: &str = "Invalid request body";
const INVALID_LIMIT: &str = "Invalid limit parameter";

/// A JSON body with a declared set of required fields.
pub trait RequestBody: DeserializeOwned {
    const REQUIRED: &'static [&'static str];
}

/// JSON extractor that rejects bodies missing any required field.
///
/// A field that is present but `null` counts as missing.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: RequestBody + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|e| {
                debug!("Rejected request body: {}", e);
                AppError::BadRequest(INVALID_BODY.into())
            })?;

        let Some(object) = value.as_object() else {
            return Err(AppError::BadRequest(INVALID_BODY.into()));
        };

        let missing: Vec<&str> = T::REQUIRED
            .iter()
            .copied()
            .filter(|field| object.get(*field).map_or(true, |v| v.is_null()))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value).map(ValidatedJson).map_err(|e| {
            debug!("Request body has invalid field types: {}", e);
            AppError::BadRequest(INVALID_BODY.into())
        })
    }
}

/// Parses a `limit` query value using integer-prefix semantics.
///
/// `"5"` and `"5abc"` both yield 5; an absent value yields the default.
/// Values with no leading digits are rejected rather than forwarded.
pub fn parse_limit(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_RUN_LIMIT);
    };

    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..end]
        .parse::<u32>()
        .map_err(|_| AppError::BadRequest(INVALID_LIMIT.into()))
}

/// The `limit` query parameter of a runs listing.
///
/// When `limit` is repeated the first value wins. Undecodable query strings
/// are rejected with the same message as an unparsable limit.
pub struct RunLimit(pub u32);

impl<S> FromRequestParts<S> for RunLimit
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!("Rejected query string: {}", e);
                AppError::BadRequest(INVALID_LIMIT.into())
            })?;

        let raw = pairs
            .iter()
            .find(|(key, _)| key == "limit")
            .map(|(_, value)| value.as_str());
        parse_limit(raw).map(RunLimit)
    }
}
