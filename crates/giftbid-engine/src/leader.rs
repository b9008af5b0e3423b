//! Leader election over the engine-lock singleton.
//!
//! Any number of processes may run the engine task; only the one whose
//! owner id survives the lock upsert settles rounds during that tick.
//! A crashed leader's lease lapses after the TTL and the next tick of
//! any process takes over.

use chrono::{DateTime, Utc};

use giftbid_store::Store;
use giftbid_types::{EngineConfig, EngineOwnerId};

/// One process's claim on the engine-lock singleton.
#[derive(Debug, Clone, Copy)]
pub struct LeaderElector {
    owner_id: EngineOwnerId,
    ttl_ms: u64,
}

impl LeaderElector {
    /// Choose a fresh owner identity for this process.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            owner_id: EngineOwnerId::new(),
            ttl_ms: config.lock_ttl_ms(),
        }
    }

    /// The identity written into the lock document.
    #[must_use]
    pub fn owner_id(&self) -> EngineOwnerId {
        self.owner_id
    }

    /// One acquisition attempt. Returns whether this process leads the
    /// current tick. Losing the upsert race reads as "not leader".
    #[must_use]
    pub fn try_acquire(&self, store: &Store, now: DateTime<Utc>) -> bool {
        store.try_acquire_engine_lock(self.owner_id, self.ttl_ms, now)
    }
}
