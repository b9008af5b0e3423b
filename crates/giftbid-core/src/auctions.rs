//! Auction lifecycle: create, start, cancel, and lookups.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use giftbid_store::Store;
use giftbid_types::{
    Auction, AuctionConfig, AuctionId, AuctionState, EndReason, GiftbidError, Result, RoundState,
};

use crate::ledger;

/// Request to create an auction. `config` fields are clamped into range.
#[derive(Debug, Clone)]
pub struct CreateAuction {
    pub title: String,
    pub total_quantity: u32,
    pub config: AuctionConfig,
}

/// Create a draft auction.
///
/// # Errors
/// `INVALID_INPUT` for an empty title or zero quantity.
pub fn create_auction(store: &Store, input: CreateAuction, now: DateTime<Utc>) -> Result<Auction> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(GiftbidError::InvalidInput {
            reason: "title must not be empty".into(),
        });
    }
    if input.total_quantity == 0 {
        return Err(GiftbidError::InvalidInput {
            reason: "totalQuantity must be at least 1".into(),
        });
    }
    let config = input.config.clamped(input.total_quantity);
    store.with_txn(|txn| {
        let auction = Auction::new(title.clone(), input.total_quantity, config, now);
        txn.put_auction(auction.clone());
        Ok(auction)
    })
}

/// `draft → running`: open round 1.
///
/// The auction deadline is fixed here when `max_duration_ms > 0`, and the
/// first round end is clamped to it.
///
/// # Errors
/// `NOT_FOUND`, or `NOT_STARTABLE` unless the auction is a draft.
pub fn start_auction(store: &Store, auction_id: AuctionId, now: DateTime<Utc>) -> Result<Auction> {
    let auction = store.with_txn(|txn| {
        let mut auction = txn.auction(auction_id)?;
        if auction.state != AuctionState::Draft {
            return Err(GiftbidError::NotStartable {
                state: auction.state,
            });
        }
        auction.state = AuctionState::Running;
        auction.current_round = 1;
        auction.round_state = Some(RoundState::Open);
        auction.ends_at = (auction.config.max_duration_ms > 0)
            .then(|| now + Duration::milliseconds(auction.config.max_duration_ms as i64));
        let mut round_ends_at = now + Duration::milliseconds(auction.config.round_duration_ms as i64);
        if let Some(ends_at) = auction.ends_at {
            round_ends_at = round_ends_at.min(ends_at);
        }
        auction.round_ends_at = Some(round_ends_at);
        auction.touch(now);
        txn.put_auction(auction.clone());
        Ok(auction)
    })?;
    info!(auction = %auction.id, "auction started");
    Ok(auction)
}

/// `draft | running → cancelled`: flip the state, then flip every active
/// bid to `withdrawn` and return its reservation — all in one
/// transaction. A reservation shortage here is fatal.
///
/// # Errors
/// `NOT_FOUND`, `NOT_CANCELLABLE` for ended/cancelled auctions, or
/// `INVARIANT_VIOLATION` on a refund shortage.
pub fn cancel_auction(store: &Store, auction_id: AuctionId, now: DateTime<Utc>) -> Result<Auction> {
    let auction = store.with_txn(|txn| {
        let mut auction = txn.auction(auction_id)?;
        match auction.state {
            AuctionState::Draft | AuctionState::Running => {}
            state => return Err(GiftbidError::NotCancellable { state }),
        }
        auction.state = AuctionState::Cancelled;
        auction.end_reason = Some(EndReason::Cancelled);
        auction.ended_at = Some(now);
        auction.clear_round_fields();

        for bid in txn.active_bids(auction_id) {
            let mut bid = bid;
            let mut user = txn.user(bid.user_id)?;
            let entry = ledger::apply_unreserve(&mut user, bid.amount, auction_id, bid.id, now)?;
            bid.mark_withdrawn(now)?;
            txn.put_bid(bid);
            txn.put_user(user);
            txn.append_ledger(entry);
        }

        auction.touch(now);
        txn.put_auction(auction.clone());
        Ok(auction)
    })?;
    info!(auction = %auction.id, "auction cancelled");
    Ok(auction)
}

/// Load an auction.
///
/// # Errors
/// `NOT_FOUND` if absent.
pub fn get_auction(store: &Store, auction_id: AuctionId) -> Result<Auction> {
    store.with_txn(|txn| txn.auction(auction_id))
}

/// All auctions, sorted by id (creation order for v7 ids).
///
/// # Errors
/// Store errors only.
pub fn list_auctions(store: &Store) -> Result<Vec<Auction>> {
    store.with_txn(|txn| Ok(txn.all_auctions()))
}
