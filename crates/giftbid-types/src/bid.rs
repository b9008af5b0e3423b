//! Bid document — one per `(auction, user)`, enforced by a unique index.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, GiftbidError, Result, UserId};

/// Bid lifecycle state.
///
/// `— → active → {won | lost | withdrawn}`; a withdrawn bid returns to
/// `active` when the user places again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BidStatus {
    Active,
    Won,
    Lost,
    Withdrawn,
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Withdrawn => "withdrawn",
        };
        write!(f, "{s}")
    }
}

/// Settlement payload, present only when the bid is `won`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BidSettlement {
    /// Round number in which the bid won.
    pub won_round: u32,
    /// Which of the auction's items this winner received, `1..=awarded_count`.
    pub gift_serial: u32,
    /// Uniform price of the winning round.
    pub clearing_price: u64,
    /// Amount spent: equals the clearing price.
    pub paid: u64,
    /// Reservation returned: `amount - clearing_price`.
    pub refunded: u64,
    pub settled_at: DateTime<Utc>,
}

/// A user's single maximum-price bid in one auction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Instant of the most recent place/raise; the ranking tie-break.
    pub last_bid_at: DateTime<Utc>,
    /// The user's maximum price. Strictly positive.
    pub amount: u64,
    pub status: BidStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<BidSettlement>,
}

impl Bid {
    /// Create a fresh active bid.
    #[must_use]
    pub fn new_active(auction_id: AuctionId, user_id: UserId, amount: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            user_id,
            created_at: now,
            updated_at: now,
            last_bid_at: now,
            amount,
            status: BidStatus::Active,
            settlement: None,
        }
    }

    /// Raise an active bid, or reactivate a withdrawn one with a new amount.
    ///
    /// # Errors
    /// Returns `BID_NOT_ACTIVE` if the bid is `won` or `lost`.
    pub fn raise_to(&mut self, amount: u64, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            BidStatus::Active | BidStatus::Withdrawn => {
                self.status = BidStatus::Active;
                self.amount = amount;
                self.last_bid_at = now;
                self.updated_at = now;
                Ok(())
            }
            BidStatus::Won | BidStatus::Lost => Err(GiftbidError::BidNotActive {
                status: self.status,
            }),
        }
    }

    /// `active → withdrawn`.
    ///
    /// # Errors
    /// Returns `BID_NOT_ACTIVE` unless the bid is currently active.
    pub fn mark_withdrawn(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != BidStatus::Active {
            return Err(GiftbidError::BidNotActive {
                status: self.status,
            });
        }
        self.status = BidStatus::Withdrawn;
        self.updated_at = now;
        Ok(())
    }

    /// `active → won` with the settlement payload.
    ///
    /// # Errors
    /// Returns `INVARIANT_VIOLATION` unless the bid is currently active —
    /// the settlement fence should have excluded everything else.
    pub fn mark_won(&mut self, settlement: BidSettlement, now: DateTime<Utc>) -> Result<()> {
        if self.status != BidStatus::Active {
            return Err(GiftbidError::InvariantViolation {
                reason: format!("cannot settle bid {} in status {}", self.id, self.status),
            });
        }
        self.status = BidStatus::Won;
        self.settlement = Some(settlement);
        self.updated_at = now;
        Ok(())
    }

    /// `active → lost`, used for the terminal refund sweep.
    ///
    /// # Errors
    /// Returns `INVARIANT_VIOLATION` unless the bid is currently active.
    pub fn mark_lost(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != BidStatus::Active {
            return Err(GiftbidError::InvariantViolation {
                reason: format!("cannot mark bid {} lost in status {}", self.id, self.status),
            });
        }
        self.status = BidStatus::Lost;
        self.updated_at = now;
        Ok(())
    }
}
