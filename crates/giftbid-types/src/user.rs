//! User account document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Balance, UserId};

/// A user account with its money triple and lifetime top-up total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    pub balance: Balance,
    /// Monotonic lifetime sum of all `topup` ledger entries.
    pub total_topups: u64,
}

impl User {
    /// Create a fresh user with zero balance.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            created_at: now,
            balance: Balance::zero(),
            total_topups: 0,
        }
    }

    /// The conservation invariant: `total_topups == available + reserved + spent`.
    #[must_use]
    pub fn conserves_topups(&self) -> bool {
        self.total_topups == self.balance.total()
    }
}
