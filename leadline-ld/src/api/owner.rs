//! Owner identity extraction
//!
//! The engine works on behalf of an already-authenticated owner; the
//! boundary in front of this service is expected to have resolved the
//! session and to pass the owner identifier in the `X-Owner-Id` header.
//! Swapping in a real session layer only touches this extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Request header carrying the authenticated owner identifier
pub const OWNER_HEADER: &str = "x-owner-id";

/// The authenticated owner on whose behalf a request runs
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if value.is_empty() {
            return Err(ApiError::Unauthorized(
                "missing X-Owner-Id header".to_string(),
            ));
        }

        Ok(OwnerId(value.to_string()))
    }
}
