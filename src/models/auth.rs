use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Caller-supplied login time, carried into the login event
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub authorized: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FraudStatusRequest {
    pub user_address: String,
    pub is_fraud: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FraudStatusResponse {
    pub identity: String,
    pub is_fraudulent: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub owner: String,
}
