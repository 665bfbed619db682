// Application state (AppState)

use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::models::user::Identity;
use crate::stores::user_directory::UserDirectory;
use crate::wal::wal::{Wal, WalOperation};
use std::sync::Arc;
use tracing::warn;

/// Shared application state
///
/// One directory per process, built with the configured authority.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<UserDirectory>,

    pub metrics: Arc<Metrics>,

    /// Write-Ahead Log for persistence
    pub wal: Arc<Wal>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, wal: Wal) -> Self {
        let config = Arc::new(config);

        let directory = UserDirectory::with_capacity(
            Identity::new(config.directory.authority.clone()),
            config.directory.capacity,
            config.directory.event_buffer,
        );

        Self {
            directory: Arc::new(directory),
            metrics: Arc::new(Metrics::new()),
            wal: Arc::new(wal),
            config,
        }
    }

    /// Append `op` to the WAL.
    ///
    /// Called from directory commit hooks, so the line is written while the
    /// identity's entry is still locked. A failed write is logged and the
    /// in-memory change stands.
    pub fn persist(&self, op: &WalOperation) {
        if let Err(e) = self.wal.log_operation(op) {
            warn!(error = %e, "Failed to write operation to WAL");
        }
    }
}
