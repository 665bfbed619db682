use crate::models::admin::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

pub async fn fallback_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            success: false,
            error: "Invalid endpoint. Valid endpoints: /register, /login, /fraud-status, /users/{identity}, /owner, /health"
                .to_string(),
        }),
    )
        .into_response()
}
