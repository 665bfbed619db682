use crate::models::user::Identity;
use serde::Serialize;

/// Notification published by the directory after a successful operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DirectoryEvent {
    UserRegistered {
        identity: Identity,
        username: String,
    },
    UserLoggedIn {
        identity: Identity,
        username: String,
        time: String,
    },
    FraudStatusUpdated {
        identity: Identity,
        fraudulent: bool,
    },
}

impl DirectoryEvent {
    pub fn identity(&self) -> &Identity {
        match self {
            DirectoryEvent::UserRegistered { identity, .. }
            | DirectoryEvent::UserLoggedIn { identity, .. }
            | DirectoryEvent::FraudStatusUpdated { identity, .. } => identity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DirectoryEvent::UserRegistered { .. } => "user_registered",
            DirectoryEvent::UserLoggedIn { .. } => "user_logged_in",
            DirectoryEvent::FraudStatusUpdated { .. } => "fraud_status_updated",
        }
    }
}
