use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque caller-supplied account key, analogous to a public address
///
/// Surrounding whitespace is stripped on construction, whichever way the
/// identity arrives (header, body, path or WAL).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.len() == value.len() {
            Self(value)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// Stored directory entry for one identity
#[derive(Clone, Debug)]
pub struct UserRecord {
    /// Username given at registration
    pub username: String,
    /// Credential given at registration, stored verbatim
    pub credential: String,
    /// Always true once the record exists
    pub exists: bool,
    /// Whether the authority has flagged this account
    pub fraudulent: bool,
}

impl UserRecord {
    pub fn new(username: String, credential: String) -> Self {
        Self {
            username,
            credential,
            exists: true,
            fraudulent: false,
        }
    }
}

/// Read-only view of a record's public fields.
///
/// The credential is deliberately absent. Unknown identities map to the
/// default view with `exists == false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub identity: String,
    pub username: String,
    pub exists: bool,
    #[serde(rename = "is_fraudulent")]
    pub fraudulent: bool,
}

impl UserSnapshot {
    pub fn of(identity: &Identity, record: &UserRecord) -> Self {
        Self {
            identity: identity.to_string(),
            username: record.username.clone(),
            exists: record.exists,
            fraudulent: record.fraudulent,
        }
    }

    pub fn absent(identity: &Identity) -> Self {
        Self {
            identity: identity.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_trimmed_everywhere() {
        let expected = Identity::from("0xa1");

        assert_eq!(Identity::new(" 0xa1\t"), expected);
        assert_eq!(Identity::from(" 0xa1 ".to_string()), expected);
        assert_eq!(serde_json::from_str::<Identity>("\"  0xa1 \"").unwrap(), expected);
        assert_eq!(serde_json::to_string(&expected).unwrap(), "\"0xa1\"");
        assert!(Identity::new("   ").is_empty());
    }

    #[test]
    fn test_new_record_defaults() {
        let record = UserRecord::new("alice".to_string(), "password123".to_string());
        assert!(record.exists);
        assert!(!record.fraudulent);
    }

    #[test]
    fn test_snapshot_hides_credential() {
        let identity = Identity::from("0xa1");
        let record = UserRecord::new("alice".to_string(), "password123".to_string());
        let json = serde_json::to_string(&UserSnapshot::of(&identity, &record)).unwrap();

        assert!(json.contains("\"exists\":true"));
        assert!(json.contains("\"is_fraudulent\":false"));
        assert!(!json.contains("password123"));
    }

    #[test]
    fn test_absent_snapshot() {
        let snapshot = UserSnapshot::absent(&Identity::from("0xdead"));
        assert_eq!(snapshot.identity, "0xdead");
        assert!(!snapshot.exists);
        assert!(!snapshot.fraudulent);
        assert!(snapshot.username.is_empty());
    }
}
