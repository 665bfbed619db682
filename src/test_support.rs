// Shared fixtures for unit tests

use crate::core::config::{
    Config, DirectoryConfig, LoggingConfig, PersistenceConfig, ServerConfig, SyncConfig,
};
use crate::core::state::AppState;
use crate::wal::wal::Wal;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_AUTHORITY: &str = "0xowner";
pub const TEST_API_KEY: &str = "test-api-key";

pub fn create_test_config(wal_dir: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            port: Some(8080),
            unix_socket: None,
            num_threads: 4,
        },
        directory: DirectoryConfig {
            authority: TEST_AUTHORITY.to_string(),
            capacity: 1000,
            event_buffer: 64,
        },
        persistence: PersistenceConfig {
            wal_path: wal_dir.path().join("test.wal"),
        },
        sync: SyncConfig {
            api_key: TEST_API_KEY.to_string(),
            fraud_feed_endpoint: None,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            console: true,
        },
    }
}

/// Fresh state backed by a WAL in its own temp dir; keep the dir alive for the test
pub fn create_test_state() -> (Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let wal = Wal::new(config.persistence.wal_path.clone()).unwrap();

    (Arc::new(AppState::new(config, wal)), temp_dir)
}
