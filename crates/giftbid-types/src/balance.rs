//! Balance tracking for the Giftbid reservation model.
//!
//! Every user carries a `(available, reserved, spent)` triple:
//! - **available**: usable for new bids and raises
//! - **reserved**: locked by the user's active bid(s)
//! - **spent**: paid out through won rounds
//!
//! All money is non-negative integer units. The conservation invariant
//! `total_topups == available + reserved + spent` is checked by the audit.

use serde::{Deserialize, Serialize};

/// A user's money triple.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Available for new bids.
    pub available: u64,
    /// Reserved by active bids awaiting a round close.
    pub reserved: u64,
    /// Spent through settled wins.
    pub spent: u64,
}

impl Balance {
    /// Create a zero balance.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Total money held: available + reserved + spent.
    ///
    /// Saturating so a corrupted document cannot panic the audit that is
    /// trying to report it.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.available
            .saturating_add(self.reserved)
            .saturating_add(self.spent)
    }

    /// Whether this balance holds no money at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.reserved == 0 && self.spent == 0
    }
}
