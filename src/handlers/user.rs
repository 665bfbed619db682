use crate::core::state::AppState;
use crate::models::auth::OwnerResponse;
use crate::models::user::{Identity, UserSnapshot};
use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;

/// Public view of one directory entry
///
/// GET /users/{identity}
pub async fn user_handler(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Json<UserSnapshot> {
    Json(state.directory.user(&Identity::new(identity)))
}

/// GET /owner
pub async fn owner_handler(State(state): State<Arc<AppState>>) -> Json<OwnerResponse> {
    Json(OwnerResponse {
        owner: state.directory.authority().to_string(),
    })
}
