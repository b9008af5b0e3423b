//! # giftbid-store
//!
//! Embedded transactional document store for the **Giftbid** auction
//! service: five typed collections (Users, Auctions, Bids, Rounds,
//! Ledger) plus the engine-lock singleton.
//!
//! The core's contract with its store is MongoDB-shaped — snapshot
//! transactions, atomic find-and-update with predicates, unique indexes,
//! duplicate-key races — but the database client itself is out of scope,
//! so this crate provides the same contract in-process:
//!
//! - [`Store::with_txn`] runs a closure against a [`Txn`] view. Reads see
//!   the transaction's own buffered writes; commit validates everything
//!   read against the committed state and either applies atomically or
//!   fails. Transient conflicts are retried transparently (≤ 5 attempts).
//! - Unique indexes on `(auctionId, userId)` of Bids,
//!   `(auctionId, roundNumber)` of Rounds, and — partially, over `won`
//!   bids only — `(auctionId, giftSerial)`. Violations surface as
//!   [`GiftbidError::DuplicateKey`] with the index name, exactly where
//!   the bidding and settlement machinery expects to handle them.
//! - [`Store::try_acquire_engine_lock`] is the leader-election upsert:
//!   predicated on "mine, expired, or missing", TTL-stamped, one attempt
//!   per call.
//!
//! [`GiftbidError::DuplicateKey`]: giftbid_types::GiftbidError::DuplicateKey

pub mod store;
pub mod txn;

pub use store::Store;
pub use txn::Txn;
