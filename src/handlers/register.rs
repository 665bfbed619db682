use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::handlers::caller::Caller;
use crate::models::admin::SuccessResponse;
use crate::models::auth::RegisterRequest;
use crate::wal::wal::WalOperation;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Register the calling identity
///
/// POST /register  (X-Caller: <identity>)  {"username": "...", "password": "..."}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    // Logged under the new entry's lock so replay sees the same order
    let op = WalOperation::Register {
        identity: caller.clone(),
        username: body.username.clone(),
        credential: body.password.clone(),
    };

    let result = state.directory.register_with(
        caller.clone(),
        body.username.clone(),
        body.password,
        || state.persist(&op),
    );

    // Update metrics
    state.metrics.record_registration(result.is_ok());

    if let Err(e) = result {
        warn!(identity = %caller, error = %e, "Registration rejected");
        return Err(e.into());
    }

    info!(identity = %caller, username = %body.username, "User registered");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "User registered successfully".to_string(),
        }),
    )
        .into_response())
}
