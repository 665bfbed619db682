use crate::api::client::FraudFeedClient;
use crate::core::error::AdminError;
use crate::core::startup::sync_fraud_feed;
use crate::core::state::AppState;
use crate::models::admin::{ApiKeyQuery, ReloadResponse};
use crate::utils::auth::verify_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Re-pull fraud verdicts from the configured feed
///
/// POST /reload?api_key=<key>
pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    // Verify API key
    if !verify_api_key(&params.api_key, &state.config.sync.api_key) {
        warn!("Unauthorized reload attempt");
        return Err(AdminError::InvalidApiKey);
    }

    // Reload needs a configured feed
    let endpoint = state
        .config
        .sync
        .fraud_feed_endpoint
        .clone()
        .ok_or(AdminError::FeedNotConfigured)?;

    info!(endpoint = %endpoint, "Starting fraud feed reload");

    let client = FraudFeedClient::new(endpoint, state.config.sync.api_key.clone())
        .map_err(|e| AdminError::ApiClientError(e.to_string()))?;

    // Apply verdicts; each change is written to the WAL as it lands
    let summary = sync_fraud_feed(&state, &client)
        .await
        .map_err(|e| AdminError::FeedError(format!("{:#}", e)))?;

    Ok((
        StatusCode::OK,
        Json(ReloadResponse {
            success: true,
            verdicts_applied: summary.applied,
            verdicts_unchanged: summary.unchanged,
            verdicts_ignored: summary.ignored,
            verdicts_skipped: summary.skipped,
        }),
    )
        .into_response())
}
