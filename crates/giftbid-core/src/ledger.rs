//! Balance mutation rules.
//!
//! Every movement of money goes through one of these functions: they
//! mutate the user's `(available, reserved, spent)` triple under the
//! required predicate and emit the matching ledger entry, so the triple
//! and the ledger can never drift apart inside a committed transaction.
//!
//! The lifecycle for one bid:
//! 1. `apply_topup` — external money in, `available` grows
//! 2. `apply_reserve` — bid placed/raised, `available → reserved`
//! 3. `apply_win` — round won, `reserved → spent` (+ surplus back)
//! 4. `apply_unreserve` — withdrawn / lost / cancelled, `reserved → available`

use chrono::{DateTime, Utc};

use giftbid_types::{
    AuctionId, BidId, GiftbidError, LedgerEntry, LedgerEntryType, LedgerMeta, Result, User,
};

/// Credit a top-up: `available += amount`, `total_topups += amount`.
///
/// # Errors
/// `INVALID_INPUT` if `amount` is zero or the balance would overflow.
pub fn apply_topup(user: &mut User, amount: u64, now: DateTime<Utc>) -> Result<LedgerEntry> {
    if amount == 0 {
        return Err(GiftbidError::InvalidInput {
            reason: "topup amount must be positive".into(),
        });
    }
    let available = user.balance.available.checked_add(amount);
    let total = user.total_topups.checked_add(amount);
    let (Some(available), Some(total)) = (available, total) else {
        return Err(GiftbidError::InvalidInput {
            reason: "topup overflows the balance range".into(),
        });
    };
    user.balance.available = available;
    user.total_topups = total;
    Ok(LedgerEntry::new(
        user.id,
        LedgerEntryType::Topup,
        amount,
        None,
        None,
        now,
    ))
}

/// Reserve a bid delta: `available -= delta`, `reserved += delta`,
/// predicated on `available >= delta`.
///
/// # Errors
/// `INSUFFICIENT_FUNDS` if the predicate fails.
pub fn apply_reserve(
    user: &mut User,
    delta: u64,
    auction_id: AuctionId,
    bid_id: BidId,
    now: DateTime<Utc>,
) -> Result<LedgerEntry> {
    if delta == 0 {
        return Err(GiftbidError::InvariantViolation {
            reason: "reserve delta must be positive".into(),
        });
    }
    if user.balance.available < delta {
        return Err(GiftbidError::InsufficientFunds {
            needed: delta,
            available: user.balance.available,
        });
    }
    user.balance.available -= delta;
    user.balance.reserved += delta;
    Ok(LedgerEntry::new(
        user.id,
        LedgerEntryType::Reserve,
        delta,
        Some(auction_id),
        Some(LedgerMeta::for_bid(bid_id)),
        now,
    ))
}

/// Return a reservation: `reserved -= amount`, `available += amount`,
/// predicated on `reserved >= amount`.
///
/// A shortage here means money went missing inside a transaction — it is
/// fatal, not a user error.
///
/// # Errors
/// `INVARIANT_VIOLATION` if the predicate fails.
pub fn apply_unreserve(
    user: &mut User,
    amount: u64,
    auction_id: AuctionId,
    bid_id: BidId,
    now: DateTime<Utc>,
) -> Result<LedgerEntry> {
    if amount == 0 || user.balance.reserved < amount {
        return Err(GiftbidError::InvariantViolation {
            reason: format!(
                "cannot unreserve {amount} for user {}: reserved is {}",
                user.id, user.balance.reserved
            ),
        });
    }
    user.balance.reserved -= amount;
    user.balance.available += amount;
    Ok(LedgerEntry::new(
        user.id,
        LedgerEntryType::Unreserve,
        amount,
        Some(auction_id),
        Some(LedgerMeta::for_bid(bid_id)),
        now,
    ))
}

/// Settle a win: the full reservation `amount` leaves `reserved`; `paid`
/// goes to `spent` and `refunded` (the surplus over the clearing price)
/// returns to `available`. Emits a `spend` entry and, when `refunded > 0`,
/// a `refund` entry.
///
/// # Errors
/// `INVARIANT_VIOLATION` if `paid + refunded != amount` or the
/// reservation predicate fails.
pub fn apply_win(
    user: &mut User,
    amount: u64,
    paid: u64,
    refunded: u64,
    auction_id: AuctionId,
    bid_id: BidId,
    round_number: u32,
    now: DateTime<Utc>,
) -> Result<Vec<LedgerEntry>> {
    if paid == 0 || paid.checked_add(refunded) != Some(amount) {
        return Err(GiftbidError::InvariantViolation {
            reason: format!("win split {paid}+{refunded} does not match bid amount {amount}"),
        });
    }
    if user.balance.reserved < amount {
        return Err(GiftbidError::InvariantViolation {
            reason: format!(
                "cannot settle {amount} for user {}: reserved is {}",
                user.id, user.balance.reserved
            ),
        });
    }
    user.balance.reserved -= amount;
    user.balance.spent += paid;
    user.balance.available += refunded;

    let meta = LedgerMeta::for_round(bid_id, round_number);
    let mut entries = vec![LedgerEntry::new(
        user.id,
        LedgerEntryType::Spend,
        paid,
        Some(auction_id),
        Some(meta),
        now,
    )];
    if refunded > 0 {
        entries.push(LedgerEntry::new(
            user.id,
            LedgerEntryType::Refund,
            refunded,
            Some(auction_id),
            Some(meta),
            now,
        ));
    }
    Ok(entries)
}
