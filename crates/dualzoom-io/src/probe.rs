//! Storage liveness probing.
//!
//! The probe is diagnostic only: its outcome is logged and never feeds back
//! into viewer initialization.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::fetch::agent_with_timeout;
use crate::storage::StorageConfig;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a single liveness request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    /// The endpoint answered with a 2xx status.
    Healthy,
    /// The endpoint answered, but not with 2xx.
    Degraded { status: u16 },
    /// No HTTP answer at all.
    Unreachable { message: String },
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

/// GET the liveness URL once, without retrying.
pub fn probe(url: &str, timeout: Duration) -> Health {
    match agent_with_timeout(timeout, false).get(url).call() {
        Ok(response) if response.status().is_success() => Health::Healthy,
        Ok(response) => Health::Degraded {
            status: response.status().as_u16(),
        },
        Err(e) => Health::Unreachable {
            message: e.to_string(),
        },
    }
}

/// Probe the storage endpoint and log the outcome.
pub fn check_connectivity(storage: &StorageConfig) -> Health {
    let url = storage.liveness_url();
    let health = probe(&url, PROBE_TIMEOUT);
    match &health {
        Health::Healthy => log::info!("Object storage is accessible at {}", storage.endpoint),
        Health::Degraded { status } => log::warn!(
            "Object storage may not be fully ready ({} answered HTTP {})",
            url,
            status
        ),
        Health::Unreachable { message } => {
            log::error!("Object storage connectivity check failed: {}", message)
        }
    }
    health
}

/// Run [`check_connectivity`] on a background thread.
///
/// Callers may drop the handle; the result is already logged.
pub fn spawn_connectivity_check(storage: StorageConfig) -> JoinHandle<Health> {
    thread::spawn(move || check_connectivity(&storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub;

    #[test]
    fn test_probe_healthy() {
        let (base, server) = stub::serve(1, "200 OK", Vec::new());
        let storage = StorageConfig::new(&base, "images");
        assert_eq!(check_connectivity(&storage), Health::Healthy);
        let heads = server.join().unwrap();
        assert!(heads[0].starts_with("GET /minio/health/live "));
    }

    #[test]
    fn test_probe_503_is_degraded() {
        let (base, server) = stub::serve(1, "503 Service Unavailable", Vec::new());
        let storage = StorageConfig::new(&base, "images");
        assert_eq!(
            check_connectivity(&storage),
            Health::Degraded { status: 503 }
        );
        server.join().unwrap();
    }

    #[test]
    fn test_probe_unreachable() {
        let health = probe("http://127.0.0.1:9/minio/health/live", Duration::from_secs(2));
        assert!(matches!(health, Health::Unreachable { .. }));
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_background_check_reports_back() {
        let (base, server) = stub::serve(1, "200 OK", Vec::new());
        let handle = spawn_connectivity_check(StorageConfig::new(&base, "images"));
        assert!(handle.join().unwrap().is_healthy());
        server.join().unwrap();
    }
}
