use crate::core::error::DirectoryError;
use crate::models::event::DirectoryEvent;
use crate::models::user::{Identity, UserRecord, UserSnapshot};
use crate::utils::auth::secure_eq;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Registry of user accounts keyed by identity.
///
/// Every operation on a single identity runs under that key's shard lock, so
/// register, login and fraud updates for the same identity are linearizable.
/// Commit hooks run under that lock; events are published after it is released.
pub struct UserDirectory {
    users: DashMap<Identity, UserRecord>,
    authority: Identity,
    events: broadcast::Sender<DirectoryEvent>,
}

impl UserDirectory {
    /// Create an empty directory whose fraud flags can only be changed by `authority`
    pub fn new(authority: Identity) -> Self {
        Self::with_capacity(authority, 0, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_capacity(authority: Identity, capacity: usize, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));

        Self {
            users: DashMap::with_capacity(capacity),
            authority,
            events,
        }
    }

    /// The identity allowed to change fraud status
    pub fn authority(&self) -> &Identity {
        &self.authority
    }

    /// Create a record for `identity`.
    ///
    /// Registration is create-once: a second call for the same identity fails
    /// with `AlreadyRegistered` and leaves the stored record untouched.
    pub fn register(
        &self,
        identity: Identity,
        username: String,
        credential: String,
    ) -> Result<(), DirectoryError> {
        self.register_with(identity, username, credential, || {})
    }

    /// `register`, running `on_commit` while the new entry is still locked.
    ///
    /// Anything `on_commit` writes for this identity is ordered the same way
    /// as the directory mutations themselves.
    pub fn register_with<F>(
        &self,
        identity: Identity,
        username: String,
        credential: String,
        on_commit: F,
    ) -> Result<(), DirectoryError>
    where
        F: FnOnce(),
    {
        if identity.is_empty() {
            return Err(DirectoryError::EmptyField("identity"));
        }
        if username.is_empty() {
            return Err(DirectoryError::EmptyField("username"));
        }
        if credential.is_empty() {
            return Err(DirectoryError::EmptyField("credential"));
        }

        match self.users.entry(identity.clone()) {
            Entry::Occupied(_) => return Err(DirectoryError::AlreadyRegistered),
            Entry::Vacant(slot) => {
                let record = slot.insert(UserRecord::new(username.clone(), credential));
                on_commit();
                drop(record);
            }
        }

        self.publish(DirectoryEvent::UserRegistered { identity, username });
        Ok(())
    }

    /// Check a login attempt.
    ///
    /// Returns true only for an existing, non-fraudulent record whose username
    /// and credential match exactly. Unknown account, wrong credential and
    /// flagged account are indistinguishable to the caller. `time` does not
    /// affect the result.
    pub fn login(&self, identity: &Identity, username: &str, credential: &str, time: &str) -> bool {
        let authorized = match self.users.get(identity) {
            Some(record) => {
                let username_ok = record.username == username;
                let credential_ok = secure_eq(credential, &record.credential);
                !record.fraudulent && username_ok && credential_ok
            }
            None => false,
        };

        if authorized {
            self.publish(DirectoryEvent::UserLoggedIn {
                identity: identity.clone(),
                username: username.to_string(),
                time: time.to_string(),
            });
        } else {
            debug!(identity = %identity, "Login rejected");
        }

        authorized
    }

    /// Set the fraud flag of an existing record. Only the authority may call this.
    pub fn update_fraud_status(
        &self,
        caller: &Identity,
        identity: &Identity,
        fraudulent: bool,
    ) -> Result<(), DirectoryError> {
        self.update_fraud_status_with(caller, identity, fraudulent, || {})
    }

    /// `update_fraud_status`, running `on_commit` while the record is still locked
    pub fn update_fraud_status_with<F>(
        &self,
        caller: &Identity,
        identity: &Identity,
        fraudulent: bool,
        on_commit: F,
    ) -> Result<(), DirectoryError>
    where
        F: FnOnce(),
    {
        self.authorize(caller, identity)?;

        {
            let mut record = self
                .users
                .get_mut(identity)
                .ok_or(DirectoryError::NotFound)?;
            record.fraudulent = fraudulent;
            on_commit();
        }

        self.publish(DirectoryEvent::FraudStatusUpdated {
            identity: identity.clone(),
            fraudulent,
        });
        Ok(())
    }

    /// Flag a record unless it is already flagged. Never clears a flag.
    ///
    /// Returns whether the flag changed; `on_commit` and the event only fire
    /// when it did.
    pub fn mark_fraudulent<F>(
        &self,
        caller: &Identity,
        identity: &Identity,
        on_commit: F,
    ) -> Result<bool, DirectoryError>
    where
        F: FnOnce(),
    {
        self.authorize(caller, identity)?;

        {
            let mut record = self
                .users
                .get_mut(identity)
                .ok_or(DirectoryError::NotFound)?;
            if record.fraudulent {
                return Ok(false);
            }
            record.fraudulent = true;
            on_commit();
        }

        self.publish(DirectoryEvent::FraudStatusUpdated {
            identity: identity.clone(),
            fraudulent: true,
        });
        Ok(true)
    }

    /// Current fraud flag; an unknown identity is not fraudulent
    pub fn is_user_fraudulent(&self, identity: &Identity) -> bool {
        self.users
            .get(identity)
            .map(|record| record.fraudulent)
            .unwrap_or(false)
    }

    /// Snapshot of the public fields stored for `identity`
    pub fn user(&self, identity: &Identity) -> UserSnapshot {
        self.users
            .get(identity)
            .map(|record| UserSnapshot::of(identity, record.value()))
            .unwrap_or_else(|| UserSnapshot::absent(identity))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    /// Re-insert a registration read back from the WAL.
    ///
    /// Returns false if the identity is already present.
    pub fn restore_registration(&self, identity: Identity, username: String, credential: String) -> bool {
        match self.users.entry(identity) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(UserRecord::new(username, credential));
                true
            }
        }
    }

    /// Re-apply a fraud flag read back from the WAL.
    ///
    /// Returns false if the identity is unknown.
    pub fn restore_fraud_status(&self, identity: &Identity, fraudulent: bool) -> bool {
        match self.users.get_mut(identity) {
            Some(mut record) => {
                record.fraudulent = fraudulent;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn fraudulent_count(&self) -> usize {
        self.users.iter().filter(|entry| entry.value().fraudulent).count()
    }

    /// Copy of every stored record, for rewriting the WAL
    pub fn records(&self) -> Vec<(Identity, UserRecord)> {
        self.users
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn authorize(&self, caller: &Identity, identity: &Identity) -> Result<(), DirectoryError> {
        if caller != &self.authority {
            warn!(caller = %caller, identity = %identity, "Fraud status change by non-authority rejected");
            return Err(DirectoryError::Unauthorized);
        }
        Ok(())
    }

    fn publish(&self, event: DirectoryEvent) {
        // Err only means nobody is subscribed
        let _ = self.events.send(event);
    }
}
