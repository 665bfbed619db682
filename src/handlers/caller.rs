use crate::core::error::ApiError;
use crate::models::user::Identity;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const CALLER_HEADER: &str = "x-caller";

/// Identity the request is attributed to, taken from the `X-Caller` header
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(Identity::new)
            .ok_or(ApiError::MissingCaller)?;

        // Whitespace-only counts as missing
        if identity.is_empty() {
            return Err(ApiError::MissingCaller);
        }

        Ok(Caller(identity))
    }
}
