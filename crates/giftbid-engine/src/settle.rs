//! Settlement of one closing round — the commit path of the auction.
//!
//! Everything runs in a single transaction fenced on the closing token:
//!
//! 1. Re-read the auction; if it is no longer `running`/`closing` under
//!    this token, another worker handled it — abort silently.
//! 2. Select up to `min(winnersPerRound, remaining)` winners under the
//!    ranking; the clearing price is the last winner's amount.
//! 3. Insert the Round receipt first. Its `(auction, roundNumber)` unique
//!    index is the idempotency gate: a duplicate key means "already
//!    settled" and the whole attempt is swallowed.
//! 4. Flip each winner `active → won`, move their money
//!    (`reserved → spent`, surplus back to `available`), and append the
//!    `spend`/`refund` ledger entries.
//! 5. Decide whether the auction ends (`soldOut` > `maxDuration` >
//!    `emptyRounds`) and either sweep the remaining active bids to
//!    `lost` with refunds, or open the next round.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use giftbid_core::{ledger, ranking};
use giftbid_store::Store;
use giftbid_types::{
    AuctionId, AuctionState, BidSettlement, ClosingToken, EndReason, Result, Round, RoundState,
    RoundWinner,
};

/// Settle the closing round of `auction_id`, fenced on `token`.
///
/// Returns the settled Round, or `None` when there was nothing to do
/// (fence mismatch or already settled).
///
/// # Errors
/// `INVARIANT_VIOLATION` if money or bid state does not match the fence's
/// promises; store errors after retry exhaustion.
pub fn settle_closing_round(
    store: &Store,
    auction_id: AuctionId,
    token: ClosingToken,
    now: DateTime<Utc>,
) -> Result<Option<Round>> {
    let outcome = store.with_txn(|txn| {
        let Some(mut auction) = txn.find_auction(auction_id) else {
            return Ok(None);
        };
        if auction.state != AuctionState::Running
            || auction.round_state != Some(RoundState::Closing)
            || auction.closing_token != Some(token)
        {
            return Ok(None);
        }

        let remaining = auction.remaining_quantity();
        let k = auction.config.winners_per_round.min(remaining) as usize;
        let selection = if k > 0 {
            ranking::select_winners(txn.active_bids(auction_id), k)
        } else {
            ranking::WinnerSelection::empty()
        };

        let round_number = auction.current_round;
        let mut winners = Vec::with_capacity(selection.winners.len());
        for (i, bid) in selection.winners.iter().enumerate() {
            winners.push(RoundWinner {
                user_id: bid.user_id,
                amount: bid.amount,
                gift_serial: auction.awarded_count + i as u32 + 1,
                paid: selection.clearing_price,
                refunded: bid.amount - selection.clearing_price,
            });
        }

        let round = Round::new(
            auction_id,
            round_number,
            selection.clearing_price,
            winners.clone(),
            now,
        );
        // The idempotency gate: this insert commits the settlement.
        txn.insert_round(round.clone())?;

        for (bid, winner) in selection.winners.into_iter().zip(&winners) {
            let mut bid = bid;
            bid.mark_won(
                BidSettlement {
                    won_round: round_number,
                    gift_serial: winner.gift_serial,
                    clearing_price: winner.paid,
                    paid: winner.paid,
                    refunded: winner.refunded,
                    settled_at: now,
                },
                now,
            )?;
            let mut user = txn.user(bid.user_id)?;
            let entries = ledger::apply_win(
                &mut user,
                winner.amount,
                winner.paid,
                winner.refunded,
                auction_id,
                bid.id,
                round_number,
                now,
            )?;
            txn.put_bid(bid);
            txn.put_user(user);
            for entry in entries {
                txn.append_ledger(entry);
            }
        }

        let winner_count = winners.len() as u32;
        auction.awarded_count += winner_count;
        auction.revenue += round.revenue();

        let sold_out = auction.awarded_count >= auction.total_quantity;
        let forced_by_duration = auction.ends_at.map_or(false, |ends_at| now >= ends_at);
        let empty_round = remaining > 0 && winner_count == 0;
        auction.consecutive_empty_rounds = if empty_round {
            auction.consecutive_empty_rounds + 1
        } else {
            0
        };
        let forced_by_empty = empty_round
            && auction.config.max_consecutive_empty_rounds > 0
            && auction.consecutive_empty_rounds >= auction.config.max_consecutive_empty_rounds;

        if sold_out || forced_by_duration || forced_by_empty {
            auction.state = AuctionState::Ended;
            auction.ended_at = Some(now);
            auction.end_reason = Some(if sold_out {
                EndReason::SoldOut
            } else if forced_by_duration {
                EndReason::MaxDuration
            } else {
                EndReason::EmptyRounds
            });
            auction.clear_round_fields();

            // The terminal refund sweep: every still-active bid loses and
            // gets its reservation back.
            for bid in txn.active_bids(auction_id) {
                let mut bid = bid;
                bid.mark_lost(now)?;
                let mut user = txn.user(bid.user_id)?;
                let entry =
                    ledger::apply_unreserve(&mut user, bid.amount, auction_id, bid.id, now)?;
                txn.put_bid(bid);
                txn.put_user(user);
                txn.append_ledger(entry);
            }
        } else {
            auction.current_round += 1;
            auction.round_state = Some(RoundState::Open);
            let mut round_ends_at =
                now + Duration::milliseconds(auction.config.round_duration_ms as i64);
            if let Some(ends_at) = auction.ends_at {
                round_ends_at = round_ends_at.min(ends_at);
            }
            auction.round_ends_at = Some(round_ends_at);
            auction.closing_token = None;
            auction.closing_started_at = None;
        }

        auction.touch(now);
        txn.put_auction(auction);
        Ok(Some(round))
    });

    match outcome {
        Ok(Some(round)) => {
            info!(
                auction = %auction_id,
                round = round.round_number,
                winners = round.winners.len(),
                clearing_price = round.clearing_price,
                "round settled"
            );
            Ok(Some(round))
        }
        Ok(None) => Ok(None),
        // Duplicate on the rounds index: a previous run already
        // committed this round. Idempotent, not an error.
        Err(err) if err.is_duplicate_on("rounds") => {
            warn!(auction = %auction_id, "round already settled, skipping");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
