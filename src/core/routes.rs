// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Directory operations (caller from X-Caller)
        .route("/register", post(handlers::register::register_handler))
        .route("/login", post(handlers::login::login_handler))
        .route("/fraud-status", post(handlers::fraud::update_fraud_status_handler))

        // Public queries
        .route("/fraud-status/{identity}", get(handlers::fraud::fraud_status_handler))
        .route("/users/{identity}", get(handlers::user::user_handler))
        .route("/owner", get(handlers::user::owner_handler))
        .route("/health", get(handlers::health::health_handler))

        // Admin endpoints (require API key)
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .route("/reload", post(handlers::admin::reload_handler))

        .fallback(handlers::fallback::fallback_handler)

        .with_state(state)
}
