//! Health State - Liveness and Readiness
//!
//! Readiness depends on the service accepting queries (not shutting
//! down) and on its chain and order store dependencies being
//! reachable. Liveness is unconditional.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Cleared once graceful shutdown begins.
    accepting: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (accepting by default).
    pub fn new() -> Self {
        Self {
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flip readiness off for the rest of the process lifetime.
    pub fn begin_shutdown(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
    }

    /// Ready when accepting and every dependency reports healthy.
    pub fn is_ready(&self, dependencies_healthy: bool) -> bool {
        self.is_accepting() && dependencies_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_clears_readiness() {
        let health = HealthState::new();
        assert!(health.is_ready(true));
        assert!(!health.is_ready(false));

        let clone = health.clone();
        clone.begin_shutdown();
        assert!(!health.is_accepting());
        assert!(!health.is_ready(true));
    }
}
