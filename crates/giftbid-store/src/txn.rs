//! Transaction view over the committed state.
//!
//! A [`Txn`] buffers writes and records what it read. Reads consult the
//! buffer first, so a transaction always sees its own writes. Commit
//! (driven by [`Store::with_txn`]) takes the write lock once, checks the
//! unique indexes, validates every recorded read against the committed
//! state, and applies the buffer atomically — or fails with
//! `DUPLICATE_KEY` / `TRANSIENT_CONFLICT` and applies nothing.
//!
//! Point lookups through the `(auction, user)` bid index deliberately go
//! unrecorded: a "no bid yet" answer is not a repeatable-read guarantee,
//! and two concurrent first placements are meant to race on the unique
//! index — one inserts, the other gets the duplicate-key error its
//! caller retries on. That mirrors the store contract the bidding logic
//! is written against.
//!
//! [`Store::with_txn`]: crate::store::Store::with_txn

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use giftbid_types::{
    Auction, AuctionId, Bid, BidId, BidStatus, GiftbidError, LedgerEntry, Result, Round, User,
    UserId,
};

use crate::store::{Committed, VersionedDoc};

/// A point read recorded for commit-time validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DocKey {
    User(UserId),
    Auction(AuctionId),
    Bid(BidId),
}

/// A collection whose scan generation was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Coll {
    Users,
    Auctions,
    Bids,
    Rounds,
    Ledger,
}

#[derive(Default)]
struct WriteSet {
    users: HashMap<UserId, User>,
    auctions: HashMap<AuctionId, Auction>,
    bids: HashMap<BidId, Bid>,
    /// Bid ids in `bids` that are first-time inserts (unique-index checked).
    new_bids: HashSet<BidId>,
    rounds: Vec<Round>,
    ledger: Vec<LedgerEntry>,
}

impl WriteSet {
    fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.auctions.is_empty()
            && self.bids.is_empty()
            && self.rounds.is_empty()
            && self.ledger.is_empty()
    }
}

/// One in-flight transaction.
pub struct Txn {
    inner: Arc<RwLock<Committed>>,
    doc_reads: Vec<(DocKey, Option<u64>)>,
    scan_gens: HashMap<Coll, u64>,
    writes: WriteSet,
}

impl Txn {
    pub(crate) fn new(inner: Arc<RwLock<Committed>>) -> Self {
        Self {
            inner,
            doc_reads: Vec::new(),
            scan_gens: HashMap::new(),
            writes: WriteSet::default(),
        }
    }

    fn record_doc(&mut self, key: DocKey, rev: Option<u64>) {
        self.doc_reads.push((key, rev));
    }

    fn record_scan(&mut self, coll: Coll, gen: u64) {
        self.scan_gens.entry(coll).or_insert(gen);
    }

    // =================================================================
    // Users
    // =================================================================

    /// Load a user, or `None` if absent.
    pub fn find_user(&mut self, id: UserId) -> Option<User> {
        if let Some(user) = self.writes.users.get(&id) {
            return Some(user.clone());
        }
        let read = {
            let guard = self.inner.read();
            guard.users.get(&id).map(|v| (v.rev, v.doc.clone()))
        };
        match read {
            Some((rev, doc)) => {
                self.record_doc(DocKey::User(id), Some(rev));
                Some(doc)
            }
            None => {
                self.record_doc(DocKey::User(id), None);
                None
            }
        }
    }

    /// Load a user or fail with `NOT_FOUND`.
    ///
    /// # Errors
    /// `NOT_FOUND` if the user does not exist.
    pub fn user(&mut self, id: UserId) -> Result<User> {
        self.find_user(id).ok_or_else(|| GiftbidError::NotFound {
            entity: "user",
            id: id.to_string(),
        })
    }

    /// Buffer an insert or update of a user document.
    pub fn put_user(&mut self, user: User) {
        self.writes.users.insert(user.id, user);
    }

    /// All users, for the audit sums.
    pub fn all_users(&mut self) -> Vec<User> {
        let (gen, mut map): (u64, HashMap<UserId, User>) = {
            let guard = self.inner.read();
            (
                guard.gens.users,
                guard
                    .users
                    .values()
                    .map(|v| (v.doc.id, v.doc.clone()))
                    .collect(),
            )
        };
        self.record_scan(Coll::Users, gen);
        for user in self.writes.users.values() {
            map.insert(user.id, user.clone());
        }
        let mut out: Vec<User> = map.into_values().collect();
        out.sort_by_key(|u| u.id);
        out
    }

    // =================================================================
    // Auctions
    // =================================================================

    /// Load an auction, or `None` if absent.
    pub fn find_auction(&mut self, id: AuctionId) -> Option<Auction> {
        if let Some(auction) = self.writes.auctions.get(&id) {
            return Some(auction.clone());
        }
        let read = {
            let guard = self.inner.read();
            guard.auctions.get(&id).map(|v| (v.rev, v.doc.clone()))
        };
        match read {
            Some((rev, doc)) => {
                self.record_doc(DocKey::Auction(id), Some(rev));
                Some(doc)
            }
            None => {
                self.record_doc(DocKey::Auction(id), None);
                None
            }
        }
    }

    /// Load an auction or fail with `NOT_FOUND`.
    ///
    /// # Errors
    /// `NOT_FOUND` if the auction does not exist.
    pub fn auction(&mut self, id: AuctionId) -> Result<Auction> {
        self.find_auction(id).ok_or_else(|| GiftbidError::NotFound {
            entity: "auction",
            id: id.to_string(),
        })
    }

    /// Buffer an insert or update of an auction document.
    pub fn put_auction(&mut self, auction: Auction) {
        self.writes.auctions.insert(auction.id, auction);
    }

    /// All auctions, sorted by id.
    pub fn all_auctions(&mut self) -> Vec<Auction> {
        let (gen, mut map): (u64, HashMap<AuctionId, Auction>) = {
            let guard = self.inner.read();
            (
                guard.gens.auctions,
                guard
                    .auctions
                    .values()
                    .map(|v| (v.doc.id, v.doc.clone()))
                    .collect(),
            )
        };
        self.record_scan(Coll::Auctions, gen);
        for auction in self.writes.auctions.values() {
            map.insert(auction.id, auction.clone());
        }
        let mut out: Vec<Auction> = map.into_values().collect();
        out.sort_by_key(|a| a.id);
        out
    }

    // =================================================================
    // Bids
    // =================================================================

    /// Point lookup through the `(auction, user)` unique index.
    ///
    /// An absent result is intentionally not validated at commit; the
    /// unique index catches the race (see module docs).
    pub fn find_bid_for(&mut self, auction_id: AuctionId, user_id: UserId) -> Option<Bid> {
        if let Some(bid) = self
            .writes
            .bids
            .values()
            .find(|b| b.auction_id == auction_id && b.user_id == user_id)
        {
            return Some(bid.clone());
        }
        let read = {
            let guard = self.inner.read();
            guard
                .bid_by_auction_user
                .get(&(auction_id, user_id))
                .and_then(|id| guard.bids.get(id))
                .map(|v| (v.doc.id, v.rev, v.doc.clone()))
        };
        match read {
            Some((id, rev, doc)) => {
                self.record_doc(DocKey::Bid(id), Some(rev));
                Some(doc)
            }
            None => None,
        }
    }

    /// Buffer a first-time bid insert; the `(auction, user)` unique index
    /// is enforced at commit.
    pub fn insert_bid(&mut self, bid: Bid) {
        self.writes.new_bids.insert(bid.id);
        self.writes.bids.insert(bid.id, bid);
    }

    /// Buffer an update of an existing bid.
    pub fn put_bid(&mut self, bid: Bid) {
        self.writes.bids.insert(bid.id, bid);
    }

    /// All bids of one auction, any status, sorted by id.
    pub fn bids_for_auction(&mut self, auction_id: AuctionId) -> Vec<Bid> {
        self.scan_bids(Some(auction_id), None)
    }

    /// The auction's currently active bids, sorted by id.
    pub fn active_bids(&mut self, auction_id: AuctionId) -> Vec<Bid> {
        self.scan_bids(Some(auction_id), Some(BidStatus::Active))
    }

    /// Every bid in the store, for the global audit.
    pub fn all_bids(&mut self) -> Vec<Bid> {
        self.scan_bids(None, None)
    }

    fn scan_bids(&mut self, auction_id: Option<AuctionId>, status: Option<BidStatus>) -> Vec<Bid> {
        let (gen, mut map): (u64, HashMap<BidId, Bid>) = {
            let guard = self.inner.read();
            (
                guard.gens.bids,
                guard
                    .bids
                    .values()
                    .filter(|v| auction_id.map_or(true, |a| v.doc.auction_id == a))
                    .map(|v| (v.doc.id, v.doc.clone()))
                    .collect(),
            )
        };
        self.record_scan(Coll::Bids, gen);
        for bid in self.writes.bids.values() {
            if auction_id.map_or(true, |a| bid.auction_id == a) {
                map.insert(bid.id, bid.clone());
            }
        }
        let mut out: Vec<Bid> = map
            .into_values()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .collect();
        out.sort_by_key(|b| b.id);
        out
    }

    // =================================================================
    // Rounds
    // =================================================================

    /// Buffer a round insert. The `(auction, round number)` unique index
    /// is the settlement idempotency gate; a duplicate fails immediately
    /// (and again at commit if a racer got in between).
    ///
    /// # Errors
    /// `DUPLICATE_KEY` on the `rounds` index.
    pub fn insert_round(&mut self, round: Round) -> Result<()> {
        let key = (round.auction_id, round.round_number);
        let already_buffered = self
            .writes
            .rounds
            .iter()
            .any(|r| (r.auction_id, r.round_number) == key);
        let already_committed = { self.inner.read().round_by_number.contains_key(&key) };
        if already_buffered || already_committed {
            return Err(GiftbidError::DuplicateKey { index: "rounds" });
        }
        self.writes.rounds.push(round);
        Ok(())
    }

    /// All settled rounds of one auction, ordered by round number.
    pub fn rounds_for_auction(&mut self, auction_id: AuctionId) -> Vec<Round> {
        let (gen, mut rounds): (u64, Vec<Round>) = {
            let guard = self.inner.read();
            (
                guard.gens.rounds,
                guard
                    .rounds
                    .values()
                    .filter(|v| v.doc.auction_id == auction_id)
                    .map(|v| v.doc.clone())
                    .collect(),
            )
        };
        self.record_scan(Coll::Rounds, gen);
        rounds.extend(
            self.writes
                .rounds
                .iter()
                .filter(|r| r.auction_id == auction_id)
                .cloned(),
        );
        rounds.sort_by_key(|r| r.round_number);
        rounds
    }

    // =================================================================
    // Ledger
    // =================================================================

    /// Append one immutable ledger entry.
    pub fn append_ledger(&mut self, entry: LedgerEntry) {
        self.writes.ledger.push(entry);
    }

    /// Ledger entries attributed to one auction, in append order.
    pub fn ledger_for_auction(&mut self, auction_id: AuctionId) -> Vec<LedgerEntry> {
        self.scan_ledger(|e| e.auction_id == Some(auction_id))
    }

    /// The whole ledger, in append order.
    pub fn all_ledger(&mut self) -> Vec<LedgerEntry> {
        self.scan_ledger(|_| true)
    }

    fn scan_ledger(&mut self, pred: impl Fn(&LedgerEntry) -> bool) -> Vec<LedgerEntry> {
        let (gen, mut entries): (u64, Vec<LedgerEntry>) = {
            let guard = self.inner.read();
            (
                guard.gens.ledger,
                guard.ledger.iter().filter(|e| pred(e)).cloned().collect(),
            )
        };
        self.record_scan(Coll::Ledger, gen);
        entries.extend(self.writes.ledger.iter().filter(|e| pred(e)).cloned());
        entries
    }

    // =================================================================
    // Commit
    // =================================================================

    /// Validate and apply. See module docs for the ordering: unique
    /// indexes first (duplicate-key carries meaning to callers), then
    /// read validation, then the atomic apply.
    pub(crate) fn commit(self) -> Result<()> {
        let mut guard = self.inner.write();

        // Unique index: one bid per (auction, user).
        for id in &self.writes.new_bids {
            let bid = &self.writes.bids[id];
            if let Some(existing) = guard.bid_by_auction_user.get(&(bid.auction_id, bid.user_id)) {
                if existing != id {
                    return Err(GiftbidError::DuplicateKey { index: "bids" });
                }
            }
        }

        // Unique index: one round per (auction, round number).
        for round in &self.writes.rounds {
            if guard
                .round_by_number
                .contains_key(&(round.auction_id, round.round_number))
            {
                return Err(GiftbidError::DuplicateKey { index: "rounds" });
            }
        }

        // Partial unique index: one won bid per (auction, gift serial).
        let mut serials_in_txn: HashSet<(AuctionId, u32)> = HashSet::new();
        for bid in self.writes.bids.values() {
            if bid.status != BidStatus::Won {
                continue;
            }
            let Some(settlement) = bid.settlement else {
                continue;
            };
            let key = (bid.auction_id, settlement.gift_serial);
            if !serials_in_txn.insert(key) {
                return Err(GiftbidError::DuplicateKey { index: "giftSerial" });
            }
            if let Some(owner) = guard.serial_owner.get(&key) {
                if *owner != bid.id {
                    return Err(GiftbidError::DuplicateKey { index: "giftSerial" });
                }
            }
        }

        // Validate point reads.
        for (key, rev) in &self.doc_reads {
            let current = match key {
                DocKey::User(id) => guard.users.get(id).map(|v| v.rev),
                DocKey::Auction(id) => guard.auctions.get(id).map(|v| v.rev),
                DocKey::Bid(id) => guard.bids.get(id).map(|v| v.rev),
            };
            if current != *rev {
                return Err(GiftbidError::TransientConflict);
            }
        }

        // Validate scans.
        for (coll, gen) in &self.scan_gens {
            let current = match coll {
                Coll::Users => guard.gens.users,
                Coll::Auctions => guard.gens.auctions,
                Coll::Bids => guard.gens.bids,
                Coll::Rounds => guard.gens.rounds,
                Coll::Ledger => guard.gens.ledger,
            };
            if current != *gen {
                return Err(GiftbidError::TransientConflict);
            }
        }

        if self.writes.is_empty() {
            return Ok(());
        }

        // Apply.
        for (id, user) in self.writes.users {
            match guard.users.entry(id) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    let v = e.get_mut();
                    v.doc = user;
                    v.rev += 1;
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(VersionedDoc { doc: user, rev: 1 });
                }
            }
            guard.gens.users += 1;
        }
        for (id, auction) in self.writes.auctions {
            match guard.auctions.entry(id) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    let v = e.get_mut();
                    v.doc = auction;
                    v.rev += 1;
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(VersionedDoc { doc: auction, rev: 1 });
                }
            }
            guard.gens.auctions += 1;
        }
        for (id, bid) in self.writes.bids {
            guard
                .bid_by_auction_user
                .insert((bid.auction_id, bid.user_id), id);
            if bid.status == BidStatus::Won {
                if let Some(settlement) = bid.settlement {
                    guard
                        .serial_owner
                        .insert((bid.auction_id, settlement.gift_serial), id);
                }
            }
            match guard.bids.entry(id) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    let v = e.get_mut();
                    v.doc = bid;
                    v.rev += 1;
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(VersionedDoc { doc: bid, rev: 1 });
                }
            }
            guard.gens.bids += 1;
        }
        for round in self.writes.rounds {
            guard
                .round_by_number
                .insert((round.auction_id, round.round_number), round.id);
            guard
                .rounds
                .insert(round.id, VersionedDoc { doc: round, rev: 1 });
            guard.gens.rounds += 1;
        }
        if !self.writes.ledger.is_empty() {
            guard.ledger.extend(self.writes.ledger);
            guard.gens.ledger += 1;
        }

        Ok(())
    }
}
