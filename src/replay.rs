// ABOUTME: Short-window replay suppression for continuously scanned admission tokens
// ABOUTME: DashMap fingerprint cache with a background eviction sweep task
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Replay Guard
//!
//! A gate camera sampling video frames will present the *same* decoded token
//! dozens of times per second while a holder stands at the gate. Each
//! distinct physical scan must be processed exactly once; everything else in
//! the window is a duplicate frame, not a new scan.
//!
//! The fingerprint covers the full token string, not just `jti`: retrying the
//! same rotated token is deduplicated, while a freshly rotated token for the
//! same ticket is a new scan.
//!
//! This cache is per-process and in-memory. A deployment with multiple
//! concurrent gate-verification nodes needs a shared TTL-bearing store for
//! cross-node correctness; that is a scaling boundary, not solved here.

use crate::config::ReplayConfig;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Concurrent fingerprint cache with TTL-bounded entries
///
/// Safe for concurrent use from many scan-handling workers; the map is
/// sharded internally so admissions never serialize on a single lock.
#[derive(Clone)]
pub struct ReplayGuard {
    seen: Arc<DashMap<String, Instant>>,
    window: Duration,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl ReplayGuard {
    /// Create a guard, optionally spawning the background eviction sweep
    ///
    /// Must be called from within a tokio runtime when
    /// `config.enable_background_sweep` is set.
    #[must_use]
    pub fn new(config: &ReplayConfig) -> Self {
        let seen = Arc::new(DashMap::new());

        let shutdown_tx = if config.enable_background_sweep {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let seen_clone = Arc::clone(&seen);
            let window = config.window;
            let sweep_interval = config.sweep_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::sweep(&seen_clone, window);
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("Replay sweep task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            seen,
            window: config.window,
            shutdown_tx,
        }
    }

    /// Fingerprint of a full token string
    #[must_use]
    pub fn fingerprint(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        hex::encode(digest)
    }

    /// Decide whether this token sighting is a new physical scan
    ///
    /// The first sighting within the window records the fingerprint and
    /// returns `true`; repeats return `false`. A suppressed duplicate does
    /// not refresh the window, so the first-seen timestamp wins and one
    /// token cannot be kept "fresh" by camping at the gate.
    pub fn should_process(&self, token: &str) -> bool {
        let fingerprint = Self::fingerprint(token);
        let now = Instant::now();

        match self.seen.entry(fingerprint) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.window {
                    false
                } else {
                    // Stale entry the sweep has not reached yet
                    entry.insert(now);
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Suppression window length
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Number of fingerprints currently tracked (stale entries included
    /// until the next sweep)
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Evict entries older than the window
    fn sweep(seen: &DashMap<String, Instant>, window: Duration) {
        let before = seen.len();
        let now = Instant::now();
        seen.retain(|_, last_seen| now.duration_since(*last_seen) < window);

        let removed = before.saturating_sub(seen.len());
        if removed > 0 {
            tracing::debug!("Evicted {} stale replay fingerprints", removed);
        }
    }
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        // Signal the sweep task to shut down; errors are expected if a
        // signal is already pending or the channel is closed
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                tracing::debug!(error = ?e, "Replay sweep shutdown signal send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_guard(window: Duration) -> ReplayGuard {
        ReplayGuard::new(&ReplayConfig {
            window,
            sweep_interval: Duration::from_millis(50),
            enable_background_sweep: false,
        })
    }

    #[test]
    fn test_first_sighting_processes_repeat_suppressed() {
        let guard = test_guard(Duration::from_secs(3));
        assert!(guard.should_process("token-a"));
        assert!(!guard.should_process("token-a"));
        assert!(!guard.should_process("token-a"));
    }

    #[test]
    fn test_distinct_tokens_do_not_collide() {
        let guard = test_guard(Duration::from_secs(3));
        assert!(guard.should_process("token-a"));
        assert!(guard.should_process("token-b"));
    }

    #[test]
    fn test_stale_entry_processes_again() {
        let guard = test_guard(Duration::from_millis(20));
        assert!(guard.should_process("token-a"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(guard.should_process("token-a"));
    }

    #[test]
    fn test_sweep_evicts_only_stale_entries() {
        let guard = test_guard(Duration::from_millis(30));
        guard.should_process("old");
        std::thread::sleep(Duration::from_millis(50));
        guard.should_process("fresh");

        ReplayGuard::sweep(&guard.seen, guard.window);
        assert_eq!(guard.tracked(), 1);
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        assert_eq!(
            ReplayGuard::fingerprint("abc"),
            ReplayGuard::fingerprint("abc")
        );
        assert_ne!(
            ReplayGuard::fingerprint("abc"),
            ReplayGuard::fingerprint("abd")
        );
    }
}
