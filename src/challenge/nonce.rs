//! Single-use nonce registry with periodic eviction.
//!
//! One process-wide store, constructed at startup and injected into the
//! orchestrator. All mutation goes through a single mutex so that two
//! concurrent submissions of the same challenge cannot both pass; this is
//! the one mandatory concurrency control in the engine. In a multi-process
//! deployment this map must move to a shared backing store with atomic
//! compare-and-set and TTL; the in-memory version is correct for a single
//! server instance only.

use crate::error::{Error, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A nonce is scoped to the identity and post it was issued for, not
/// globally; the same opaque string for a different post is a different
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NonceKey {
    nonce: String,
    /// Lowercased; account addresses compare case-insensitively.
    identity: String,
    post_id: i64,
}

impl NonceKey {
    fn new(nonce: &str, identity: &str, post_id: i64) -> Self {
        Self {
            nonce: nonce.to_string(),
            identity: identity.to_ascii_lowercase(),
            post_id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NonceRecord {
    consumed: bool,
    expires_at: i64,
}

/// Store counters for monitoring.
#[derive(Debug, Default, Clone)]
pub struct NonceStats {
    /// Records registered at challenge issuance.
    pub registered: u64,
    /// Successful consumptions.
    pub consumed: u64,
    /// Rejected replays.
    pub replayed: u64,
    /// Records evicted by the sweeper.
    pub evicted: u64,
}

/// Default retention for nonces first seen at consumption time.
const DEFAULT_RETENTION_SECS: i64 = 600;

/// Process-wide single-use-token registry.
#[derive(Clone)]
pub struct NonceStore {
    inner: Arc<Mutex<HashMap<NonceKey, NonceRecord>>>,
    stats: Arc<Mutex<NonceStats>>,
}

impl NonceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(NonceStats::default())),
        }
    }

    /// Record a nonce issued as part of a new challenge.
    ///
    /// `expires_at` is the challenge's own validity deadline (unix seconds);
    /// the record is retained until then so replays fail distinctly.
    pub fn register(&self, nonce: &str, identity: &str, post_id: i64, expires_at: i64) {
        let key = NonceKey::new(nonce, identity, post_id);
        let mut map = self.inner.lock();
        map.insert(
            key,
            NonceRecord {
                consumed: false,
                expires_at,
            },
        );
        self.stats.lock().registered += 1;
    }

    /// Atomically check and consume a nonce.
    ///
    /// The check-and-mark happens under one lock acquisition: of any number
    /// of concurrent calls with the same `(nonce, identity, post)` tuple,
    /// exactly one succeeds.
    ///
    /// # Errors
    ///
    /// * [`Error::Format`] for an empty nonce.
    /// * [`Error::NonceReplayed`] if the tuple was already consumed.
    /// * [`Error::NonceExpired`] if the registered record outlived its
    ///   window without being consumed.
    pub fn validate_and_consume(&self, nonce: &str, identity: &str, post_id: i64) -> Result<()> {
        if nonce.is_empty() {
            return Err(Error::Format("nonce must be a non-empty string".to_string()));
        }

        let key = NonceKey::new(nonce, identity, post_id);
        let now = Utc::now().timestamp();

        let outcome = {
            let mut map = self.inner.lock();
            match map.entry(key) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    if record.consumed {
                        Err(Error::NonceReplayed)
                    } else if now >= record.expires_at {
                        Err(Error::NonceExpired)
                    } else {
                        record.consumed = true;
                        Ok(())
                    }
                }
                Entry::Vacant(entry) => {
                    // First sighting. Mark consumed immediately so a replay
                    // of the same tuple fails even though issuance never
                    // passed through this process.
                    entry.insert(NonceRecord {
                        consumed: true,
                        expires_at: now + DEFAULT_RETENTION_SECS,
                    });
                    Ok(())
                }
            }
        };

        let mut stats = self.stats.lock();
        match &outcome {
            Ok(()) => stats.consumed += 1,
            Err(Error::NonceReplayed) => stats.replayed += 1,
            Err(_) => {}
        }
        drop(stats);
        outcome
    }

    /// Remove every record past its expiry. Returns the number evicted.
    ///
    /// Consumed records are only dropped once expired: after that point a
    /// replay already fails the expiry check, so forgetting the record is
    /// safe.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut map = self.inner.lock();
        let before = map.len();
        map.retain(|_, record| now < record.expires_at);
        let evicted = before - map.len();
        drop(map);
        if evicted > 0 {
            self.stats.lock().evicted += evicted as u64;
        }
        evicted
    }

    /// Spawn a background task sweeping expired records on an interval.
    ///
    /// Eviction bounds memory; it is not part of the hot path's
    /// correctness. Abort the handle on shutdown.
    #[must_use]
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired();
                if evicted > 0 {
                    debug!(evicted, remaining = store.len(), "swept expired nonces");
                }
            }
        })
    }

    /// Current number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the store tracks no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot of the store counters.
    #[must_use]
    pub fn stats(&self) -> NonceStats {
        self.stats.lock().clone()
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}
