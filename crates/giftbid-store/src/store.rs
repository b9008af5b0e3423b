//! Committed state, transaction driver, and the engine-lock upsert.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use giftbid_types::constants::{ENGINE_LOCK_ID, TXN_MAX_RETRIES};
use giftbid_types::{
    Auction, AuctionId, Bid, BidId, EngineLock, EngineOwnerId, LedgerEntry, Result, Round,
    RoundId, User, UserId,
};

use crate::txn::Txn;

/// A committed document plus its internal revision counter.
///
/// The revision is store-level bookkeeping for optimistic validation; it
/// is unrelated to the domain-level `Auction::version`.
#[derive(Debug, Clone)]
pub(crate) struct VersionedDoc<T> {
    pub doc: T,
    pub rev: u64,
}

/// Per-collection generation counters, bumped on any write to the
/// collection. Scans record the generation they saw; commit validation
/// rejects the transaction if it moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Gens {
    pub users: u64,
    pub auctions: u64,
    pub bids: u64,
    pub rounds: u64,
    pub ledger: u64,
}

/// The committed state of all collections and their unique indexes.
#[derive(Default)]
pub(crate) struct Committed {
    pub users: HashMap<UserId, VersionedDoc<User>>,
    pub auctions: HashMap<AuctionId, VersionedDoc<Auction>>,
    pub bids: HashMap<BidId, VersionedDoc<Bid>>,
    /// Unique index: one bid per `(auction, user)`.
    pub bid_by_auction_user: HashMap<(AuctionId, UserId), BidId>,
    pub rounds: HashMap<RoundId, VersionedDoc<Round>>,
    /// Unique index: one round per `(auction, round number)`.
    pub round_by_number: HashMap<(AuctionId, u32), RoundId>,
    /// Partial unique index over `won` bids: one `(auction, gift serial)`.
    pub serial_owner: HashMap<(AuctionId, u32), BidId>,
    /// Append-only.
    pub ledger: Vec<LedgerEntry>,
    /// Lock collection; holds only the engine singleton in practice.
    pub locks: HashMap<String, EngineLock>,
    pub gens: Gens,
}

/// Handle to the shared store. Cheap to clone; all clones see the same
/// committed state.
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<RwLock<Committed>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Committed::default())),
        }
    }

    /// Run `f` as one transaction: reads are validated and writes applied
    /// atomically at commit. Transient conflicts (another writer got in
    /// between) are retried transparently, up to
    /// [`TXN_MAX_RETRIES`] attempts in total.
    ///
    /// Duplicate-key errors are *not* retried here — they carry meaning
    /// (idempotency, concurrent first placement) and are handled by the
    /// caller that expects them.
    ///
    /// # Errors
    /// Whatever `f` returns, or the commit-time conflict if retries are
    /// exhausted.
    pub fn with_txn<T>(&self, mut f: impl FnMut(&mut Txn) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut txn = Txn::new(Arc::clone(&self.inner));
            let outcome = f(&mut txn).and_then(|value| txn.commit().map(|()| value));
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < TXN_MAX_RETRIES => continue,
                Err(err) => return Err(err),
            }
        }
    }

    // =================================================================
    // Engine lock (leader election)
    // =================================================================

    /// One acquisition attempt for the engine-lock singleton.
    ///
    /// Upsert predicated on `owner = self OR expired OR missing`; on
    /// success the lease is re-stamped to `now + ttl_ms`. Returns whether
    /// the caller is the leader for this tick.
    pub fn try_acquire_engine_lock(
        &self,
        owner_id: EngineOwnerId,
        ttl_ms: u64,
        now: DateTime<Utc>,
    ) -> bool {
        let mut guard = self.inner.write();
        let free = match guard.locks.get(ENGINE_LOCK_ID) {
            Some(lock) => lock.owner_id == owner_id || lock.is_expired(now),
            None => true,
        };
        if free {
            guard.locks.insert(
                ENGINE_LOCK_ID.to_string(),
                EngineLock::new(owner_id, ttl_ms, now),
            );
        }
        free
    }

    /// Current lock document, if any. Read-only; used by diagnostics and
    /// tests.
    #[must_use]
    pub fn engine_lock(&self) -> Option<EngineLock> {
        self.inner.read().locks.get(ENGINE_LOCK_ID).copied()
    }

    // =================================================================
    // One-shot queries
    // =================================================================

    /// Scan auctions without a transaction. Engine queries use this to
    /// find work; every hit is revalidated by a per-auction CAS
    /// transaction, so a stale result is harmless.
    #[must_use]
    pub fn scan_auctions(&self, pred: impl Fn(&Auction) -> bool, limit: usize) -> Vec<Auction> {
        let guard = self.inner.read();
        let mut hits: Vec<Auction> = guard
            .auctions
            .values()
            .filter(|v| pred(&v.doc))
            .map(|v| v.doc.clone())
            .collect();
        hits.sort_by_key(|a| a.id);
        hits.truncate(limit);
        hits
    }
}
