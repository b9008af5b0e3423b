//! Round settlement receipt — unique per `(auction, round number)`.
//!
//! A successfully inserted Round is the commit point of settlement: once
//! it exists, no second settlement for that pair can occur.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, RoundId, UserId};

/// One winner of a settled round, in rank order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundWinner {
    pub user_id: UserId,
    /// The winner's max-bid at settlement time.
    pub amount: u64,
    pub gift_serial: u32,
    /// What the winner paid: the round's clearing price.
    pub paid: u64,
    /// Reservation returned: `amount - paid`.
    pub refunded: u64,
}

/// Receipt of one settled round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub auction_id: AuctionId,
    pub round_number: u32,
    pub ended_at: DateTime<Utc>,
    /// Uniform price all winners paid; 0 for a winnerless round.
    pub clearing_price: u64,
    /// Winners ordered by rank.
    pub winners: Vec<RoundWinner>,
}

impl Round {
    #[must_use]
    pub fn new(
        auction_id: AuctionId,
        round_number: u32,
        clearing_price: u64,
        winners: Vec<RoundWinner>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoundId::new(),
            auction_id,
            round_number,
            ended_at: now,
            clearing_price,
            winners,
        }
    }

    /// Total revenue of this round: winners × clearing price.
    #[must_use]
    pub fn revenue(&self) -> u64 {
        self.winners.iter().map(|w| w.paid).sum()
    }
}
