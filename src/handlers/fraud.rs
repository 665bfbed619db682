use crate::core::error::{ApiError, DirectoryError};
use crate::core::state::AppState;
use crate::handlers::caller::Caller;
use crate::models::admin::SuccessResponse;
use crate::models::auth::{FraudStatusRequest, FraudStatusResponse};
use crate::models::user::Identity;
use crate::wal::wal::WalOperation;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Set or clear the fraud flag of a registered user. Authority only.
///
/// POST /fraud-status  (X-Caller: <authority>)  {"user_address", "is_fraud"}
pub async fn update_fraud_status_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<FraudStatusRequest>,
) -> Result<Response, ApiError> {
    let target = Identity::new(body.user_address);
    if target.is_empty() {
        return Err(ApiError::InvalidParameter("user_address must not be empty".to_string()));
    }

    // Apply and log under the record's lock
    let op = WalOperation::FraudStatus {
        identity: target.clone(),
        fraudulent: body.is_fraud,
    };
    let result = state
        .directory
        .update_fraud_status_with(&caller, &target, body.is_fraud, || state.persist(&op));

    // Update metrics
    state.metrics.record_fraud_update(result.is_ok());

    match result {
        Ok(()) => {}
        Err(DirectoryError::Unauthorized) => {
            warn!(caller = %caller, identity = %target, "Unauthorized fraud status update attempt");
            return Err(DirectoryError::Unauthorized.into());
        }
        Err(e) => {
            warn!(identity = %target, error = %e, "Fraud status update rejected");
            return Err(e.into());
        }
    }

    info!(identity = %target, fraudulent = body.is_fraud, "Fraud status updated");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Fraud status updated successfully".to_string(),
        }),
    )
        .into_response())
}

/// GET /fraud-status/{identity}
pub async fn fraud_status_handler(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Json<FraudStatusResponse> {
    let identity = Identity::new(identity);
    let is_fraudulent = state.directory.is_user_fraudulent(&identity);

    Json(FraudStatusResponse {
        identity: identity.to_string(),
        is_fraudulent,
    })
}
