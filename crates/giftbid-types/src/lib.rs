//! # giftbid-types
//!
//! Shared types, errors, and configuration for the **Giftbid** multi-round
//! sealed-bid auction service.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`AuctionId`], [`BidId`], [`RoundId`],
//!   [`LedgerEntryId`], [`ClosingToken`], [`EngineOwnerId`]
//! - **User model**: [`User`], [`Balance`]
//! - **Auction model**: [`Auction`], [`AuctionState`], [`RoundState`], [`EndReason`]
//! - **Bid model**: [`Bid`], [`BidStatus`], [`BidSettlement`]
//! - **Round model**: [`Round`], [`RoundWinner`]
//! - **Ledger model**: [`LedgerEntry`], [`LedgerEntryType`], [`LedgerMeta`]
//! - **Engine lock**: [`EngineLock`]
//! - **Configuration**: [`AuctionConfig`], [`EngineConfig`], [`ServerConfig`]
//! - **Errors**: [`GiftbidError`] with stable codes
//! - **Constants**: system-wide limits and defaults

pub mod auction;
pub mod balance;
pub mod bid;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod lock;
pub mod round;
pub mod user;

// Re-export all primary types at crate root for ergonomic imports:
//   use giftbid_types::{Auction, Bid, GiftbidError, ...};

pub use auction::*;
pub use balance::*;
pub use bid::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use lock::*;
pub use round::*;
pub use user::*;

// Constants are accessed via `giftbid_types::constants::FOO`
// (not re-exported to avoid name collisions).
