//! User account operations.

use chrono::{DateTime, Utc};

use giftbid_store::Store;
use giftbid_types::{Result, User, UserId};

use crate::ledger;

/// Create a fresh user with zero balance.
///
/// # Errors
/// Store errors only.
pub fn create_user(store: &Store, now: DateTime<Utc>) -> Result<User> {
    store.with_txn(|txn| {
        let user = User::new(now);
        txn.put_user(user.clone());
        Ok(user)
    })
}

/// Load a user.
///
/// # Errors
/// `NOT_FOUND` if absent.
pub fn get_user(store: &Store, user_id: UserId) -> Result<User> {
    store.with_txn(|txn| txn.user(user_id))
}

/// Credit `amount` to the user's available balance inside one
/// transaction, appending the `topup` ledger entry.
///
/// # Errors
/// `NOT_FOUND` if the user is absent, `INVALID_INPUT` for a non-positive
/// amount.
pub fn topup(store: &Store, user_id: UserId, amount: u64, now: DateTime<Utc>) -> Result<User> {
    store.with_txn(|txn| {
        let mut user = txn.user(user_id)?;
        let entry = ledger::apply_topup(&mut user, amount, now)?;
        txn.put_user(user.clone());
        txn.append_ledger(entry);
        Ok(user)
    })
}
