use crate::stores::user_directory::UserDirectory;
use crate::utils::time::current_timestamp;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub registrations: AtomicU64,
    pub rejected_registrations: AtomicU64,
    pub login_attempts: AtomicU64,
    pub successful_logins: AtomicU64,
    pub failed_logins: AtomicU64,
    pub fraud_updates: AtomicU64,
    pub rejected_fraud_updates: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub rejected_registrations: u64,
    pub login_attempts: u64,
    pub successful_logins: u64,
    pub failed_logins: u64,
    pub login_success_rate: f64,
    pub fraud_updates: u64,
    pub rejected_fraud_updates: u64,
    pub registered_users: usize,
    pub fraudulent_users: usize,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            rejected_registrations: AtomicU64::new(0),
            login_attempts: AtomicU64::new(0),
            successful_logins: AtomicU64::new(0),
            failed_logins: AtomicU64::new(0),
            fraud_updates: AtomicU64::new(0),
            rejected_fraud_updates: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn record_registration(&self, accepted: bool) {
        if accepted {
            self.registrations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected_registrations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_login(&self, authorized: bool) {
        self.login_attempts.fetch_add(1, Ordering::Relaxed);
        if authorized {
            self.successful_logins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_logins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fraud_update(&self, accepted: bool) {
        if accepted {
            self.fraud_updates.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected_fraud_updates.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Combine counters with the directory's current size
    pub fn get_snapshot(&self, directory: &UserDirectory) -> MetricsSnapshot {
        let login_attempts = self.login_attempts.load(Ordering::Relaxed);
        let successful_logins = self.successful_logins.load(Ordering::Relaxed);

        let login_success_rate = if login_attempts > 0 {
            (successful_logins as f64 / login_attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            rejected_registrations: self.rejected_registrations.load(Ordering::Relaxed),
            login_attempts,
            successful_logins,
            failed_logins: self.failed_logins.load(Ordering::Relaxed),
            login_success_rate,
            fraud_updates: self.fraud_updates.load(Ordering::Relaxed),
            rejected_fraud_updates: self.rejected_fraud_updates.load(Ordering::Relaxed),
            registered_users: directory.len(),
            fraudulent_users: directory.fraudulent_count(),
            uptime_seconds: current_timestamp() - self.start_time,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
