//! Append-only ledger entry — the audit trail of every balance movement.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, LedgerEntryId, UserId};

/// Kind of balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEntryType {
    /// External money in: `available += amount`.
    Topup,
    /// Bid placed/raised: `available -= amount, reserved += amount`.
    Reserve,
    /// Bid withdrawn or refunded: `reserved -= amount, available += amount`.
    Unreserve,
    /// Won at the clearing price: `reserved -= …, spent += amount`.
    Spend,
    /// Winner's surplus over the clearing price: `available += amount`.
    Refund,
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Topup => "topup",
            Self::Reserve => "reserve",
            Self::Unreserve => "unreserve",
            Self::Spend => "spend",
            Self::Refund => "refund",
        };
        write!(f, "{s}")
    }
}

/// Structured context attached to an entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_id: Option<BidId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_number: Option<u32>,
}

impl LedgerMeta {
    #[must_use]
    pub fn for_bid(bid_id: BidId) -> Self {
        Self {
            bid_id: Some(bid_id),
            round_number: None,
        }
    }

    #[must_use]
    pub fn for_round(bid_id: BidId, round_number: u32) -> Self {
        Self {
            bid_id: Some(bid_id),
            round_number: Some(round_number),
        }
    }
}

/// One immutable ledger record. `amount` is strictly positive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub entry_type: LedgerEntryType,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<AuctionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<LedgerMeta>,
}

impl LedgerEntry {
    #[must_use]
    pub fn new(
        user_id: UserId,
        entry_type: LedgerEntryType,
        amount: u64,
        auction_id: Option<AuctionId>,
        meta: Option<LedgerMeta>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            created_at: now,
            user_id,
            entry_type,
            amount,
            auction_id,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_display() {
        assert_eq!(LedgerEntryType::Topup.to_string(), "topup");
        assert_eq!(LedgerEntryType::Unreserve.to_string(), "unreserve");
    }

    #[test]
    fn meta_omits_absent_fields() {
        let entry = LedgerEntry::new(
            UserId::new(),
            LedgerEntryType::Topup,
            100,
            None,
            None,
            Utc::now(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("auctionId"));
        assert!(!json.contains("meta"));
    }

    #[test]
    fn serde_roundtrip() {
        let entry = LedgerEntry::new(
            UserId::new(),
            LedgerEntryType::Spend,
            50,
            Some(AuctionId::new()),
            Some(LedgerMeta::for_round(BidId::new(), 3)),
            Utc::now(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
