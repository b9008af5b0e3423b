//! Deterministic total order over active bids, and winner selection.
//!
//! The order: higher `amount` first, then earlier `last_bid_at`, then
//! lower `user_id` (byte-lexicographic on the id). Given identical
//! inputs the selection is identical everywhere — settlement and the
//! snapshot leaderboard both rank through this one comparator.

use std::cmp::Ordering;

use giftbid_types::Bid;

/// The ranking comparator. `Less` means "ranks ahead".
#[must_use]
pub fn compare_bids(a: &Bid, b: &Bid) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.last_bid_at.cmp(&b.last_bid_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Result of winner selection for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerSelection {
    /// The first `min(n, |bids|)` bids under the ranking.
    pub winners: Vec<Bid>,
    /// The last winner's amount — the uniform price. 0 if no winners.
    pub clearing_price: u64,
}

impl WinnerSelection {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            winners: Vec::new(),
            clearing_price: 0,
        }
    }
}

/// Select up to `n` winners from `bids` under the ranking.
///
/// For `n == 0` or no bids, returns the empty selection with clearing
/// price 0.
#[must_use]
pub fn select_winners(mut bids: Vec<Bid>, n: usize) -> WinnerSelection {
    if n == 0 || bids.is_empty() {
        return WinnerSelection::empty();
    }
    bids.sort_by(compare_bids);
    bids.truncate(n);
    let clearing_price = bids.last().map_or(0, |b| b.amount);
    WinnerSelection {
        winners: bids,
        clearing_price,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use giftbid_types::{AuctionId, UserId};

    use super::*;

    fn bid(user: UserId, amount: u64, at: chrono::DateTime<Utc>) -> Bid {
        Bid::new_active(AuctionId::from_bytes([7; 16]), user, amount, at)
    }

    #[test]
    fn higher_amount_ranks_first() {
        let now = Utc::now();
        let a = bid(UserId::from_bytes([1; 16]), 100, now);
        let b = bid(UserId::from_bytes([2; 16]), 90, now);
        let sel = select_winners(vec![b, a.clone()], 1);
        assert_eq!(sel.winners[0].user_id, a.user_id);
        assert_eq!(sel.clearing_price, 100);
    }

    #[test]
    fn earlier_bid_wins_amount_tie() {
        let now = Utc::now();
        let early = bid(UserId::from_bytes([9; 16]), 100, now - Duration::seconds(1));
        let late = bid(UserId::from_bytes([1; 16]), 100, now);
        let sel = select_winners(vec![late, early.clone()], 1);
        assert_eq!(sel.winners[0].user_id, early.user_id);
    }

    #[test]
    fn lower_user_id_wins_full_tie() {
        let now = Utc::now();
        let lo = bid(UserId::from_bytes([1; 16]), 100, now);
        let hi = bid(UserId::from_bytes([2; 16]), 100, now);
        let sel = select_winners(vec![hi, lo.clone()], 1);
        assert_eq!(sel.winners[0].user_id, lo.user_id);
    }

    #[test]
    fn three_way_tie_break_order() {
        // Three bids of 100: users "b" and "a" at t, user "c" at t-1.
        // Expected order: c (earlier), then a, then b.
        let t = Utc::now();
        let user_a = UserId::from_bytes([b'a'; 16]);
        let user_b = UserId::from_bytes([b'b'; 16]);
        let user_c = UserId::from_bytes([b'c'; 16]);
        let bids = vec![
            bid(user_b, 100, t),
            bid(user_a, 100, t),
            bid(user_c, 100, t - Duration::milliseconds(1)),
        ];

        let sel = select_winners(bids.clone(), 3);
        let order: Vec<UserId> = sel.winners.iter().map(|b| b.user_id).collect();
        assert_eq!(order, vec![user_c, user_a, user_b]);
        assert_eq!(sel.clearing_price, 100);

        let sel = select_winners(bids, 2);
        let order: Vec<UserId> = sel.winners.iter().map(|b| b.user_id).collect();
        assert_eq!(order, vec![user_c, user_a]);
        assert_eq!(sel.clearing_price, 100);
    }

    #[test]
    fn clearing_price_is_last_winner() {
        let now = Utc::now();
        let bids = vec![
            bid(UserId::from_bytes([1; 16]), 30, now),
            bid(UserId::from_bytes([2; 16]), 20, now),
            bid(UserId::from_bytes([3; 16]), 10, now),
        ];
        let sel = select_winners(bids, 2);
        assert_eq!(sel.winners.len(), 2);
        assert_eq!(sel.clearing_price, 20);
    }

    #[test]
    fn fewer_bids_than_n() {
        let now = Utc::now();
        let bids = vec![bid(UserId::from_bytes([1; 16]), 50, now)];
        let sel = select_winners(bids, 10);
        assert_eq!(sel.winners.len(), 1);
        assert_eq!(sel.clearing_price, 50);
    }

    #[test]
    fn zero_n_is_empty() {
        let now = Utc::now();
        let bids = vec![bid(UserId::from_bytes([1; 16]), 50, now)];
        let sel = select_winners(bids, 0);
        assert!(sel.winners.is_empty());
        assert_eq!(sel.clearing_price, 0);
    }

    #[test]
    fn no_bids_is_empty() {
        let sel = select_winners(vec![], 5);
        assert!(sel.winners.is_empty());
        assert_eq!(sel.clearing_price, 0);
    }

    #[test]
    fn selection_is_deterministic() {
        let now = Utc::now();
        let bids: Vec<Bid> = (0u8..20)
            .map(|i| bid(UserId::from_bytes([i; 16]), 100 - u64::from(i % 5), now))
            .collect();
        let a = select_winners(bids.clone(), 7);
        let b = select_winners(bids, 7);
        assert_eq!(a, b);
    }
}
