//! # Connection Rate Gate
//!
//! Permits at most one connection attempt per cooldown window so a bug in
//! the reconnect logic cannot hammer the feed host. The wait blocks only
//! the supervisor's own loop; callers of the public API never touch it.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct RateGate {
    cooldown: Duration,
    next_allowed: Mutex<Instant>,
}

impl RateGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            next_allowed: Mutex::new(Instant::now()),
        }
    }

    /// Waits until the current cooldown window has elapsed, then opens a new
    /// one. Cancel-safe: a caller that abandons the wait (e.g. on shutdown)
    /// does not consume the window.
    pub async fn wait_to_proceed(&self) {
        let mut next_allowed = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next_allowed > now {
            sleep_until(*next_allowed).await;
        }
        *next_allowed = Instant::now() + self.cooldown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_pass_is_immediate_then_spaced_by_cooldown() {
        let gate = RateGate::new(Duration::from_secs(5));

        let start = Instant::now();
        gate.wait_to_proceed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        gate.wait_to_proceed().await;
        assert!(start.elapsed() >= Duration::from_secs(5));

        gate.wait_to_proceed().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_out_the_cooldown_makes_the_next_pass_immediate() {
        let gate = RateGate::new(Duration::from_secs(5));
        gate.wait_to_proceed().await;

        tokio::time::sleep(Duration::from_secs(6)).await;

        let before = Instant::now();
        gate.wait_to_proceed().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
