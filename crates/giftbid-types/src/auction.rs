//! Auction document and its closed state enumerations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionConfig, AuctionId, ClosingToken};

/// Auction lifecycle state.
///
/// Transitions: `draft → running` (start), `running → ended` (engine),
/// `draft | running → cancelled` (admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuctionState {
    Draft,
    Running,
    Ended,
    Cancelled,
}

impl fmt::Display for AuctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// State of the current round. Present only while the auction is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundState {
    /// Accepting bids until `round_ends_at`.
    Open,
    /// Marked due; a settlement worker owns it via the closing token.
    Closing,
}

/// Why an auction reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    SoldOut,
    MaxDuration,
    EmptyRounds,
    Cancelled,
}

/// An auction over a fixed supply of numbered gifts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub state: AuctionState,
    /// Fixed at creation; gift serials run `1..=total_quantity`.
    pub total_quantity: u32,
    /// Gifts awarded so far. Monotonic.
    pub awarded_count: u32,
    /// Sum of all clearing-price payments. Monotonic.
    pub revenue: u64,
    /// 1-based once running; 0 while draft.
    pub current_round: u32,
    pub consecutive_empty_rounds: u32,
    /// Present only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_state: Option<RoundState>,
    /// Strict upper bound on when the current round still accepts bids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_ends_at: Option<DateTime<Utc>>,
    /// Absolute auction deadline, set at start when `max_duration_ms > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    /// Fences settlement against double-run. Present only while closing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_token: Option<ClosingToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_started_at: Option<DateTime<Utc>>,
    /// Monotonic, bumped on every meaningful update.
    pub version: u64,
    pub config: AuctionConfig,
}

impl Auction {
    /// Create a draft auction. `config` is expected to be pre-clamped.
    #[must_use]
    pub fn new(title: String, total_quantity: u32, config: AuctionConfig, now: DateTime<Utc>) -> Self {
        Self {
            id: AuctionId::new(),
            created_at: now,
            updated_at: now,
            title,
            state: AuctionState::Draft,
            total_quantity,
            awarded_count: 0,
            revenue: 0,
            current_round: 0,
            consecutive_empty_rounds: 0,
            round_state: None,
            round_ends_at: None,
            ends_at: None,
            ended_at: None,
            end_reason: None,
            closing_token: None,
            closing_started_at: None,
            version: 0,
            config,
        }
    }

    /// Gifts not yet awarded.
    #[must_use]
    pub fn remaining_quantity(&self) -> u32 {
        self.total_quantity.saturating_sub(self.awarded_count)
    }

    /// Whether the auction is running with an open round.
    #[must_use]
    pub fn is_accepting_bids(&self) -> bool {
        self.state == AuctionState::Running
            && self.round_state == Some(RoundState::Open)
            && self.round_ends_at.is_some()
    }

    /// Bump `version` and `updated_at`. Every meaningful mutation ends here.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }

    /// Clear all round-lifecycle fields; used when entering a terminal state.
    pub fn clear_round_fields(&mut self) {
        self.round_state = None;
        self.round_ends_at = None;
        self.closing_token = None;
        self.closing_started_at = None;
    }
}
