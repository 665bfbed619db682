// Centralized error handling for the directory service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::admin::ErrorResponse;

/// Errors raised by mutating directory operations
///
/// Queries never produce these; they answer `false` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Only the authority can update fraud status")]
    Unauthorized,

    #[error("User not registered")]
    NotFound,

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),
}

/// Errors returned by the public directory endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing caller identity (X-Caller header)")]
    MissingCaller,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingCaller => StatusCode::BAD_REQUEST,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Directory(DirectoryError::AlreadyRegistered) => StatusCode::CONFLICT,
            ApiError::Directory(DirectoryError::Unauthorized) => StatusCode::FORBIDDEN,
            ApiError::Directory(DirectoryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Directory(DirectoryError::EmptyField(_)) => StatusCode::BAD_REQUEST,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Fraud feed is not configured")]
    FeedNotConfigured,

    #[error("Failed to create API client: {0}")]
    ApiClientError(String),

    #[error("Failed to fetch fraud feed: {0}")]
    FeedError(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AdminError::FeedNotConfigured => StatusCode::CONFLICT,
            AdminError::ApiClientError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::FeedError(_) => StatusCode::BAD_GATEWAY,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        match self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }
}
