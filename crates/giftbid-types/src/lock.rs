//! Engine leader lock — a TTL'd singleton document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EngineOwnerId;

/// The singleton lock document. Its id is [`crate::constants::ENGINE_LOCK_ID`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineLock {
    pub owner_id: EngineOwnerId,
    /// The lock is free once this instant has passed.
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EngineLock {
    #[must_use]
    pub fn new(owner_id: EngineOwnerId, ttl_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            expires_at: now + chrono::Duration::milliseconds(ttl_ms as i64),
            updated_at: now,
        }
    }

    /// Whether the lease has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
