//! Place / raise / withdraw — the bidding state machine.
//!
//! Both operations run as one transaction against the auction, the bid,
//! the user, and the ledger; a failure anywhere leaves no partial
//! mutation. Two concurrent first-time placements by the same user race
//! on the bids unique index — the loser retries the whole transaction
//! and re-reads the winner's bid.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use giftbid_store::Store;
use giftbid_types::constants::TXN_MAX_RETRIES;
use giftbid_types::{
    Auction, AuctionId, Bid, BidStatus, GiftbidError, Result, UserId,
};

use crate::ledger;

/// Place a new bid or raise an existing one to `new_amount`.
///
/// The contract, inside one transaction:
/// 1. auction must be running with an open round (`NOT_OPEN`) that has
///    not passed its end (`ROUND_ENDED`);
/// 2. a settled prior bid fails `BID_NOT_ACTIVE`; the new amount must
///    strictly exceed the active amount (`INVALID_INPUT`);
/// 3. the delta moves `available → reserved`, predicated on sufficient
///    funds (`INSUFFICIENT_FUNDS`);
/// 4. the bid is inserted, raised, or reactivated with `last_bid_at = now`;
/// 5. a `reserve` ledger entry records the delta;
/// 6. a bid landing inside the anti-snipe window extends the round end —
///    maximum-merge, clamped to the auction deadline;
/// 7. the auction version is bumped.
///
/// # Errors
/// As listed above; `NOT_FOUND` for unknown auction or user.
pub fn place_bid(
    store: &Store,
    auction_id: AuctionId,
    user_id: UserId,
    new_amount: u64,
    now: DateTime<Utc>,
) -> Result<(Auction, Bid)> {
    if new_amount == 0 {
        return Err(GiftbidError::InvalidInput {
            reason: "bid amount must be positive".into(),
        });
    }
    let mut attempt = 0;
    loop {
        attempt += 1;
        match place_bid_txn(store, auction_id, user_id, new_amount, now) {
            Err(err) if err.is_duplicate_on("bids") && attempt < TXN_MAX_RETRIES => {
                // Concurrent first placement won the insert; re-run and
                // observe it as an existing bid.
                debug!(%auction_id, %user_id, "bid insert raced, retrying");
                continue;
            }
            outcome => return outcome,
        }
    }
}

fn place_bid_txn(
    store: &Store,
    auction_id: AuctionId,
    user_id: UserId,
    new_amount: u64,
    now: DateTime<Utc>,
) -> Result<(Auction, Bid)> {
    store.with_txn(|txn| {
        let mut auction = txn.auction(auction_id)?;
        let Some(round_ends_at) = auction.round_ends_at else {
            return Err(GiftbidError::NotOpen);
        };
        if !auction.is_accepting_bids() {
            return Err(GiftbidError::NotOpen);
        }
        if now >= round_ends_at {
            return Err(GiftbidError::RoundEnded);
        }

        let existing = txn.find_bid_for(auction_id, user_id);
        let old_amount = match &existing {
            Some(bid) if matches!(bid.status, BidStatus::Won | BidStatus::Lost) => {
                return Err(GiftbidError::BidNotActive { status: bid.status });
            }
            Some(bid) if bid.status == BidStatus::Active => bid.amount,
            _ => 0,
        };
        if new_amount <= old_amount {
            return Err(GiftbidError::InvalidInput {
                reason: format!(
                    "new amount {new_amount} must exceed the current bid {old_amount}"
                ),
            });
        }
        let delta = new_amount - old_amount;

        let mut user = txn.user(user_id)?;

        let bid = match existing {
            None => {
                let bid = Bid::new_active(auction_id, user_id, new_amount, now);
                txn.insert_bid(bid.clone());
                bid
            }
            Some(mut bid) => {
                bid.raise_to(new_amount, now)?;
                txn.put_bid(bid.clone());
                bid
            }
        };

        let entry = ledger::apply_reserve(&mut user, delta, auction_id, bid.id, now)?;
        txn.put_user(user);
        txn.append_ledger(entry);

        // Anti-snipe: a bid near the end pushes the end out. Concurrent
        // placers only ever extend (maximum-merge); the auction deadline
        // always wins.
        let remaining = round_ends_at - now;
        if remaining <= Duration::milliseconds(auction.config.anti_snipe_window_ms as i64) {
            let mut candidate =
                now + Duration::milliseconds(auction.config.anti_snipe_extend_ms as i64);
            if let Some(ends_at) = auction.ends_at {
                candidate = candidate.min(ends_at);
            }
            auction.round_ends_at = Some(round_ends_at.max(candidate));
        }
        if let Some(ends_at) = auction.ends_at {
            auction.round_ends_at = auction.round_ends_at.map(|end| end.min(ends_at));
        }

        auction.touch(now);
        txn.put_auction(auction.clone());
        Ok((auction, bid))
    })
}

/// Withdraw the caller's active bid and return its reservation.
///
/// Same auction/round/time preconditions as placing. Withdrawal never
/// extends the round, and a closing round rejects it (`NOT_OPEN` — the
/// settlement fence owns the bids by then).
///
/// # Errors
/// `NOT_OPEN`, `ROUND_ENDED`, `NOT_FOUND` if the user never bid,
/// `BID_NOT_ACTIVE` unless the bid is active.
pub fn withdraw_bid(
    store: &Store,
    auction_id: AuctionId,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<Bid> {
    store.with_txn(|txn| {
        let mut auction = txn.auction(auction_id)?;
        let Some(round_ends_at) = auction.round_ends_at else {
            return Err(GiftbidError::NotOpen);
        };
        if !auction.is_accepting_bids() {
            return Err(GiftbidError::NotOpen);
        }
        if now >= round_ends_at {
            return Err(GiftbidError::RoundEnded);
        }

        let Some(mut bid) = txn.find_bid_for(auction_id, user_id) else {
            return Err(GiftbidError::NotFound {
                entity: "bid",
                id: format!("{auction_id}/{user_id}"),
            });
        };
        bid.mark_withdrawn(now)?;

        let mut user = txn.user(user_id)?;
        let entry = ledger::apply_unreserve(&mut user, bid.amount, auction_id, bid.id, now)?;

        auction.touch(now);
        txn.put_bid(bid.clone());
        txn.put_user(user);
        txn.append_ledger(entry);
        txn.put_auction(auction);
        Ok(bid)
    })
}
