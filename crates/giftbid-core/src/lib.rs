//! # giftbid-core
//!
//! The bidding state machine and financial rules of the **Giftbid**
//! multi-round sealed-bid auction service:
//!
//! - [`ranking`]: deterministic total order over bids, winner selection,
//!   uniform clearing price
//! - [`ledger`]: the `(available, reserved, spent)` mutation rules, each
//!   emitting its matching append-only ledger entry
//! - [`users`]: account creation and top-up
//! - [`auctions`]: create / start / cancel lifecycle
//! - [`bids`]: place / raise / withdraw with reservation accounting and
//!   the anti-snipe extension
//! - [`snapshot`]: the read-only derived view (leaderboard, estimated
//!   clearing price, recent rounds)
//! - [`audit`]: end-to-end financial invariant checks
//! - [`clock`]: the time seam that keeps boundary behavior testable
//!
//! Every money-touching operation is one store transaction: it either
//! commits the balance change, the bid change, and the ledger entry
//! together, or leaves nothing behind.

pub mod audit;
pub mod auctions;
pub mod bids;
pub mod clock;
pub mod ledger;
pub mod ranking;
pub mod snapshot;
pub mod users;

pub use audit::{audit_auction, audit_global, AuctionAudit, GlobalAudit};
pub use auctions::{
    cancel_auction, create_auction, get_auction, list_auctions, start_auction, CreateAuction,
};
pub use bids::{place_bid, withdraw_bid};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ranking::{compare_bids, select_winners, WinnerSelection};
pub use snapshot::{snapshot, AuctionSnapshot, LeaderboardEntry};
pub use users::{create_user, get_user, topup};
