//! Read-only derived view of one auction.
//!
//! Best-effort: the snapshot is not fenced against the engine and may
//! trail a concurrent settlement by up to one tick.

use chrono::{DateTime, Utc};
use serde::Serialize;

use giftbid_store::Store;
use giftbid_types::constants::{
    SNAPSHOT_LEADERBOARD_DISPLAY, SNAPSHOT_LEADERBOARD_FETCH_MAX, SNAPSHOT_RECENT_ROUNDS,
};
use giftbid_types::{Auction, AuctionId, Bid, Result, Round, UserId};

use crate::ranking;

/// One leaderboard row: who stands where right now.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub amount: u64,
    pub last_bid_at: DateTime<Utc>,
}

/// The snapshot payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub auction: Auction,
    /// Milliseconds until the round closes; present only while running
    /// with an open round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<u64>,
    pub remaining_quantity: u32,
    /// First 20 ranked active bids.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// The caller's bid, when a user id was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_bid: Option<Bid>,
    /// The k-th ranked active amount — what the clearing price would be
    /// if the round closed now. Null with fewer than k active bids.
    pub estimated_clearing_price: Option<u64>,
    /// Up to 5 most recent settled rounds, oldest first.
    pub recent_rounds: Vec<Round>,
}

/// Build the snapshot.
///
/// # Errors
/// `NOT_FOUND` for an unknown auction.
pub fn snapshot(
    store: &Store,
    auction_id: AuctionId,
    user_id: Option<UserId>,
    now: DateTime<Utc>,
) -> Result<AuctionSnapshot> {
    store.with_txn(|txn| {
        let auction = txn.auction(auction_id)?;

        let mut active = txn.active_bids(auction_id);
        active.sort_by(ranking::compare_bids);

        let k = auction
            .config
            .winners_per_round
            .min(auction.remaining_quantity()) as usize;
        let estimated_clearing_price = if k > 0 && active.len() >= k {
            Some(active[k - 1].amount)
        } else {
            None
        };

        let fetch = SNAPSHOT_LEADERBOARD_DISPLAY.max(k.min(SNAPSHOT_LEADERBOARD_FETCH_MAX));
        active.truncate(fetch);
        let leaderboard: Vec<LeaderboardEntry> = active
            .iter()
            .take(SNAPSHOT_LEADERBOARD_DISPLAY)
            .map(|b| LeaderboardEntry {
                user_id: b.user_id,
                amount: b.amount,
                last_bid_at: b.last_bid_at,
            })
            .collect();

        let time_remaining_ms = if auction.is_accepting_bids() {
            auction
                .round_ends_at
                .map(|end| (end - now).num_milliseconds().max(0) as u64)
        } else {
            None
        };

        let your_bid = user_id.and_then(|u| txn.find_bid_for(auction_id, u));

        let rounds = txn.rounds_for_auction(auction_id);
        let skip = rounds.len().saturating_sub(SNAPSHOT_RECENT_ROUNDS);
        let recent_rounds = rounds[skip..].to_vec();

        Ok(AuctionSnapshot {
            remaining_quantity: auction.remaining_quantity(),
            auction,
            time_remaining_ms,
            leaderboard,
            your_bid,
            estimated_clearing_price,
            recent_rounds,
        })
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use giftbid_types::AuctionConfig;

    use crate::auctions::{self, CreateAuction};
    use crate::{bids, users};

    use super::*;

    fn setup(winners: u32, quantity: u32) -> (Store, Auction, DateTime<Utc>) {
        let store = Store::new();
        let now = Utc::now();
        let auction = auctions::create_auction(
            &store,
            CreateAuction {
                title: "gifts".into(),
                total_quantity: quantity,
                config: AuctionConfig {
                    winners_per_round: winners,
                    ..AuctionConfig::default()
                },
            },
            now,
        )
        .unwrap();
        let auction = auctions::start_auction(&store, auction.id, now).unwrap();
        (store, auction, now)
    }

    fn bidder(store: &Store, auction: &Auction, amount: u64, now: DateTime<Utc>) -> UserId {
        let user = users::create_user(store, now).unwrap();
        users::topup(store, user.id, 10_000, now).unwrap();
        bids::place_bid(store, auction.id, user.id, amount, now).unwrap();
        user.id
    }

    #[test]
    fn estimated_price_is_kth_amount() {
        let (store, auction, now) = setup(2, 5);
        bidder(&store, &auction, 30, now);
        bidder(&store, &auction, 20, now);
        bidder(&store, &auction, 10, now);

        let snap = snapshot(&store, auction.id, None, now).unwrap();
        assert_eq!(snap.estimated_clearing_price, Some(20));
        assert_eq!(snap.leaderboard.len(), 3);
        assert_eq!(snap.leaderboard[0].amount, 30);
    }

    #[test]
    fn estimated_price_null_below_k() {
        let (store, auction, now) = setup(3, 5);
        bidder(&store, &auction, 30, now);
        bidder(&store, &auction, 20, now);

        let snap = snapshot(&store, auction.id, None, now).unwrap();
        assert_eq!(snap.estimated_clearing_price, None);
    }

    #[test]
    fn time_remaining_counts_down() {
        let (store, auction, now) = setup(1, 1);
        let snap = snapshot(&store, auction.id, None, now).unwrap();
        assert_eq!(snap.time_remaining_ms, Some(60_000));

        let later = now + Duration::milliseconds(45_000);
        let snap = snapshot(&store, auction.id, None, later).unwrap();
        assert_eq!(snap.time_remaining_ms, Some(15_000));
    }

    #[test]
    fn your_bid_present_for_caller() {
        let (store, auction, now) = setup(1, 1);
        let user = bidder(&store, &auction, 40, now);

        let snap = snapshot(&store, auction.id, Some(user), now).unwrap();
        assert_eq!(snap.your_bid.unwrap().amount, 40);

        let snap = snapshot(&store, auction.id, Some(UserId::new()), now).unwrap();
        assert!(snap.your_bid.is_none());
    }

    #[test]
    fn leaderboard_caps_at_twenty() {
        let (store, auction, now) = setup(10, 50);
        for i in 0..30 {
            bidder(&store, &auction, 100 + i, now);
        }
        let snap = snapshot(&store, auction.id, None, now).unwrap();
        assert_eq!(snap.leaderboard.len(), 20);
        // Ranked: highest first.
        assert_eq!(snap.leaderboard[0].amount, 129);
    }
}
