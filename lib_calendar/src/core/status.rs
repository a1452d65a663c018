//! # Connection Status
//!
//! Shared connected flag written by the supervisor task and read by
//! external health checks. Atomic so the probe never blocks.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ConnectionStatus {
    connected: AtomicBool,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Non-blocking status probe.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_tracks_transitions() {
        let status = ConnectionStatus::new();
        assert!(!status.is_connected());
        status.set_connected(true);
        assert!(status.is_connected());
        status.set_connected(false);
        assert!(!status.is_connected());
    }
}
