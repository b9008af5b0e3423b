//! Error types for the Giftbid auction service.
//!
//! Every variant carries a stable code string (see [`GiftbidError::code`])
//! that surfaces to API callers unchanged. Variants are grouped by
//! subsystem:
//! - input validation
//! - lookup
//! - auction / round / bid state conflicts
//! - funds
//! - store-internal kinds (retried or swallowed by the machinery)
//! - fatal

use thiserror::Error;

use crate::{AuctionState, BidStatus};

/// Central error enum for all Giftbid operations.
#[derive(Debug, Error)]
pub enum GiftbidError {
    // =================================================================
    // Input validation
    // =================================================================
    /// An identifier failed to parse.
    #[error("INVALID_ID: {reason}")]
    InvalidId { reason: String },

    /// A request value is out of range or contradicts the contract.
    #[error("INVALID_INPUT: {reason}")]
    InvalidInput { reason: String },

    // =================================================================
    // Lookup
    // =================================================================
    /// The referenced entity does not exist.
    #[error("NOT_FOUND: {entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    // =================================================================
    // State conflicts
    // =================================================================
    /// Start requires a draft auction.
    #[error("NOT_STARTABLE: auction is {state}, only draft auctions can start")]
    NotStartable { state: AuctionState },

    /// Cancel requires a draft or running auction.
    #[error("NOT_CANCELLABLE: auction is {state}")]
    NotCancellable { state: AuctionState },

    /// The auction is not running with an open round.
    #[error("NOT_OPEN: auction is not accepting bids")]
    NotOpen,

    /// The current round's end has passed.
    #[error("ROUND_ENDED: the current round is no longer accepting bids")]
    RoundEnded,

    /// The existing bid is settled and cannot change.
    #[error("BID_NOT_ACTIVE: bid is {status}")]
    BidNotActive { status: BidStatus },

    /// Not enough available balance to cover the reservation delta.
    #[error("INSUFFICIENT_FUNDS: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    // =================================================================
    // Store-internal
    // =================================================================
    /// Optimistic-concurrency conflict; retried transparently.
    #[error("TRANSIENT_CONFLICT: transaction read stale data")]
    TransientConflict,

    /// A unique index rejected an insert.
    #[error("DUPLICATE_KEY: unique index {index} violated")]
    DuplicateKey { index: &'static str },

    // =================================================================
    // Fatal
    // =================================================================
    /// A financial invariant did not hold. Aborts the transaction.
    #[error("INVARIANT_VIOLATION: {reason}")]
    InvariantViolation { reason: String },

    /// Unclassified internal error.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl GiftbidError {
    /// Stable machine-readable code for API responses and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "INVALID_ID",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotStartable { .. } => "NOT_STARTABLE",
            Self::NotCancellable { .. } => "NOT_CANCELLABLE",
            Self::NotOpen => "NOT_OPEN",
            Self::RoundEnded => "ROUND_ENDED",
            Self::BidNotActive { .. } => "BID_NOT_ACTIVE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::TransientConflict => "TRANSIENT_CONFLICT",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether `with_txn` may transparently re-run the transaction.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientConflict)
    }

    /// Whether this is a duplicate-key rejection on the named index.
    #[must_use]
    pub fn is_duplicate_on(&self, index: &str) -> bool {
        matches!(self, Self::DuplicateKey { index: i } if *i == index)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GiftbidError>;
