use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::client::FraudFeedClient;
use crate::core::error::DirectoryError;
use crate::core::state::AppState;
use crate::models::user::Identity;
use crate::wal::wal::WalOperation;

/// Outcome of applying one batch of fraud verdicts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    /// Verdicts that flagged a previously clean user
    pub applied: usize,
    /// Positive verdicts for users already flagged
    pub unchanged: usize,
    /// Negative verdicts; the feed never clears a flag
    pub ignored: usize,
    /// Verdicts for unknown users or otherwise rejected
    pub skipped: usize,
}

// Runs at boot, before any listener is bound
pub fn apply_wal_operations(state: &AppState, operations: &[WalOperation]) -> Result<()> {
    for op in operations {
        match op {
            WalOperation::Register {
                identity,
                username,
                credential,
            } => {
                if !state
                    .directory
                    .restore_registration(identity.clone(), username.clone(), credential.clone())
                {
                    warn!(identity = %identity, "Duplicate registration in WAL, keeping first");
                }
            }
            WalOperation::FraudStatus {
                identity,
                fraudulent,
            } => {
                if !state.directory.restore_fraud_status(identity, *fraudulent) {
                    warn!(identity = %identity, "Fraud status for unknown user in WAL, skipping");
                }
            }
        }
    }
    Ok(())
}

/// Rewrite the WAL as the minimal log of the current directory.
///
/// One REGISTER line per record, followed by a FRAUD_STATUS line for flagged
/// records. Must run while nothing else mutates the directory, so main calls
/// it before binding listeners. Returns the number of lines written.
pub fn compact_wal(state: &AppState) -> Result<usize> {
    let mut operations = Vec::with_capacity(state.directory.len());

    for (identity, record) in state.directory.records() {
        let fraudulent = record.fraudulent;

        operations.push(WalOperation::Register {
            identity: identity.clone(),
            username: record.username,
            credential: record.credential,
        });

        if fraudulent {
            operations.push(WalOperation::FraudStatus {
                identity,
                fraudulent: true,
            });
        }
    }

    state
        .wal
        .rewrite(&operations)
        .context("Failed to compact WAL")?;

    Ok(operations.len())
}

/// Pull verdicts from the fraud feed and apply them as the authority.
///
/// Only positive verdicts act, and only on users not flagged yet; a negative
/// verdict never clears a flag the authority set.
pub async fn sync_fraud_feed(state: &AppState, client: &FraudFeedClient) -> Result<FeedSummary> {
    let verdicts = client
        .fetch_verdicts()
        .await
        .context("Failed to fetch fraud verdicts")?;

    info!(verdicts = verdicts.len(), "Fraud verdicts fetched");

    let authority = state.directory.authority().clone();
    let mut summary = FeedSummary::default();

    for verdict in verdicts {
        if !verdict.is_fraud {
            summary.ignored += 1;
            continue;
        }

        let identity = Identity::new(verdict.identity);
        let op = WalOperation::FraudStatus {
            identity: identity.clone(),
            fraudulent: true,
        };

        match state
            .directory
            .mark_fraudulent(&authority, &identity, || state.persist(&op))
        {
            Ok(true) => {
                summary.applied += 1;
                state.metrics.record_fraud_update(true);
            }
            Ok(false) => summary.unchanged += 1,
            Err(DirectoryError::NotFound) => {
                summary.skipped += 1;
                warn!(identity = %identity, "Fraud verdict for unregistered user, skipping");
            }
            Err(e) => {
                summary.skipped += 1;
                warn!(identity = %identity, error = %e, "Fraud verdict rejected");
            }
        }
    }

    info!(
        applied = summary.applied,
        unchanged = summary.unchanged,
        ignored = summary.ignored,
        skipped = summary.skipped,
        fraudulent_users = state.directory.fraudulent_count(),
        "Fraud feed applied"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_state;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_apply_wal_operations_rebuilds_directory() {
        let (state, _dir) = create_test_state();
        let alice = Identity::from("0xa1");
        let bob = Identity::from("0xb2");

        let operations = vec![
            WalOperation::Register {
                identity: alice.clone(),
                username: "alice".to_string(),
                credential: "password123".to_string(),
            },
            WalOperation::Register {
                identity: bob.clone(),
                username: "bob".to_string(),
                credential: "password456".to_string(),
            },
            WalOperation::FraudStatus { identity: bob.clone(), fraudulent: true },
            WalOperation::FraudStatus { identity: Identity::from("0xghost"), fraudulent: true },
        ];

        apply_wal_operations(&state, &operations).unwrap();

        assert_eq!(state.directory.len(), 2);
        assert!(state.directory.login(&alice, "alice", "password123", "t"));
        assert!(state.directory.is_user_fraudulent(&bob));
        assert!(!state.directory.login(&bob, "bob", "password456", "t"));
    }

    fn register_logged(state: &AppState, identity: &Identity, username: &str, credential: &str) {
        let op = WalOperation::Register {
            identity: identity.clone(),
            username: username.to_string(),
            credential: credential.to_string(),
        };
        state
            .directory
            .register_with(identity.clone(), username.to_string(), credential.to_string(), || {
                state.persist(&op)
            })
            .unwrap();
    }

    fn restart(state: &AppState) -> (Arc<AppState>, TempDir) {
        let (restarted, dir) = create_test_state();
        apply_wal_operations(&restarted, &state.wal.replay().unwrap()).unwrap();
        (restarted, dir)
    }

    #[test]
    fn test_flag_racing_registration_survives_restart() {
        let (state, _dir) = create_test_state();
        let owner = state.directory.authority().clone();
        let bob = Identity::from("0xb2");
        let (committed_tx, committed_rx) = mpsc::channel();

        let registering = {
            let state = Arc::clone(&state);
            let bob = bob.clone();
            thread::spawn(move || {
                let op = WalOperation::Register {
                    identity: bob.clone(),
                    username: "bob".to_string(),
                    credential: "password456".to_string(),
                };
                state
                    .directory
                    .register_with(bob, "bob".to_string(), "password456".to_string(), || {
                        committed_tx.send(()).unwrap();
                        // Let the flag request arrive before the REGISTER line is written
                        thread::sleep(Duration::from_millis(50));
                        state.persist(&op);
                    })
                    .unwrap();
            })
        };

        committed_rx.recv().unwrap();
        let op = WalOperation::FraudStatus { identity: bob.clone(), fraudulent: true };
        state
            .directory
            .update_fraud_status_with(&owner, &bob, true, || state.persist(&op))
            .unwrap();
        registering.join().unwrap();

        assert!(state.directory.is_user_fraudulent(&bob));

        let (restarted, _restarted_dir) = restart(&state);
        assert!(restarted.directory.is_user_fraudulent(&bob));
        assert!(!restarted.directory.login(&bob, "bob", "password456", "2025-05-24"));
    }

    #[test]
    fn test_compact_wal_keeps_state() {
        let (state, _dir) = create_test_state();
        let owner = state.directory.authority().clone();
        let alice = Identity::from("0xa1");
        let bob = Identity::from("0xb2");

        register_logged(&state, &alice, "alice", "password123");
        register_logged(&state, &bob, "bob", "password456");
        for fraudulent in [true, false, true, false, true] {
            let op = WalOperation::FraudStatus { identity: bob.clone(), fraudulent };
            state
                .directory
                .update_fraud_status_with(&owner, &bob, fraudulent, || state.persist(&op))
                .unwrap();
        }
        assert_eq!(state.wal.replay().unwrap().len(), 7);

        assert_eq!(compact_wal(&state).unwrap(), 3);
        assert_eq!(state.wal.replay().unwrap().len(), 3);

        let (restarted, _restarted_dir) = restart(&state);
        assert_eq!(restarted.directory.user(&alice), state.directory.user(&alice));
        assert_eq!(restarted.directory.user(&bob), state.directory.user(&bob));
        assert!(restarted.directory.login(&alice, "alice", "password123", "t"));
        assert!(!restarted.directory.login(&bob, "bob", "password456", "t"));
    }

    #[test]
    fn test_compact_empty_directory() {
        let (state, _dir) = create_test_state();
        state
            .wal
            .log_operation(&WalOperation::FraudStatus { identity: Identity::from("0xghost"), fraudulent: true })
            .unwrap();

        assert_eq!(compact_wal(&state).unwrap(), 0);
        assert!(state.wal.replay().unwrap().is_empty());
    }

    #[test]
    fn test_wal_round_trip_through_state() {
        let (state, _dir) = create_test_state();
        let owner = state.directory.authority().clone();
        let bob = Identity::from("0xb2");

        state
            .directory
            .register(bob.clone(), "bob".to_string(), "password456".to_string())
            .unwrap();
        state
            .wal
            .log_operation(&WalOperation::Register {
                identity: bob.clone(),
                username: "bob".to_string(),
                credential: "password456".to_string(),
            })
            .unwrap();
        state.directory.update_fraud_status(&owner, &bob, true).unwrap();
        state
            .wal
            .log_operation(&WalOperation::FraudStatus { identity: bob.clone(), fraudulent: true })
            .unwrap();

        let (restarted, _restarted_dir) = create_test_state();
        apply_wal_operations(&restarted, &state.wal.replay().unwrap()).unwrap();

        assert_eq!(restarted.directory.user(&bob), state.directory.user(&bob));
    }
}
