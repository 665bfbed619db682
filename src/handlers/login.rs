use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::handlers::caller::Caller;
use crate::models::auth::{LoginRequest, LoginResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// Check the caller's credentials
///
/// POST /login  (X-Caller: <identity>)  {"username", "password", "time"}
///
/// Always 200; a rejected login is `authorized: false` with no reason given.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // Unknown account, wrong credential and flagged account all yield false
    let authorized = state
        .directory
        .login(&caller, &body.username, &body.password, &body.time);

    // Update metrics
    state.metrics.record_login(authorized);

    if authorized {
        info!(identity = %caller, username = %body.username, time = %body.time, "User logged in");
    }

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            authorized,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Identity;
    use crate::test_support::{create_test_state, TEST_AUTHORITY};
    use axum::body::Body;
    use http_body_util::BodyExt;

    fn request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            time: "2025-05-24".to_string(),
        })
    }

    async fn authorized(response: Response) -> bool {
        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);

        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        let login: LoginResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(login.success);
        login.authorized
    }

    #[tokio::test]
    async fn test_login_success() {
        let (state, _dir) = create_test_state();
        let alice = Identity::from("0xa1");
        state
            .directory
            .register(alice.clone(), "alice".to_string(), "password123".to_string())
            .unwrap();

        let response = login_handler(State(state.clone()), Caller(alice), request("alice", "password123"))
            .await
            .unwrap();

        assert!(authorized(response).await);
    }

    #[tokio::test]
    async fn test_login_failures_look_identical() {
        let (state, _dir) = create_test_state();
        let bob = Identity::from("0xb2");
        state
            .directory
            .register(bob.clone(), "bob".to_string(), "password456".to_string())
            .unwrap();

        // Wrong password
        let wrong = login_handler(State(state.clone()), Caller(bob.clone()), request("bob", "nope"))
            .await
            .unwrap();
        assert!(!authorized(wrong).await);

        // Unknown account
        let unknown = login_handler(State(state.clone()), Caller(Identity::from("0xghost")), request("bob", "password456"))
            .await
            .unwrap();
        assert!(!authorized(unknown).await);

        // Flagged account
        state
            .directory
            .update_fraud_status(&Identity::from(TEST_AUTHORITY), &bob, true)
            .unwrap();
        let flagged = login_handler(State(state.clone()), Caller(bob), request("bob", "password456"))
            .await
            .unwrap();
        assert!(!authorized(flagged).await);
    }
}
