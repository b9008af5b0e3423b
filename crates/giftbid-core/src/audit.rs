//! Financial invariant audit.
//!
//! Invariants checked after the fact, over the committed collections:
//! every check is a sum comparison, reported as a boolean so a monitor
//! can alert on any `false` without parsing details.

use std::collections::HashSet;

use serde::Serialize;

use giftbid_store::Store;
use giftbid_types::{
    AuctionId, AuctionState, BidStatus, LedgerEntry, LedgerEntryType, Result,
};

/// Global audit over all users, bids, and the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAudit {
    pub user_count: usize,
    pub total_topups: u64,
    pub total_balances: u64,
    /// `Σ topups == Σ (available + reserved + spent)`.
    pub money_conservation_ok: bool,
    /// `Σ reserved == Σ active bid amounts`.
    pub reserved_matches_active_bids_ok: bool,
    /// Unsigned money cannot go negative; reported for contract parity.
    pub negative_balances_ok: bool,
    pub ok: bool,
}

/// Per-auction audit: the ledger, the bids, and the auction counters
/// must all tell the same story.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionAudit {
    pub auction_id: AuctionId,
    pub state: AuctionState,
    /// `auction.revenue == Σ spend ledger`.
    pub revenue_matches_ledger_ok: bool,
    /// `Σ settlement.paid == Σ spend ledger`.
    pub paid_matches_ledger_ok: bool,
    /// `Σ settlement.refunded == Σ refund ledger`.
    pub refunded_matches_ledger_ok: bool,
    /// `awarded_count == |won bids|`.
    pub awarded_count_matches_won_ok: bool,
    /// Serials of won bids are exactly `{1, …, awarded_count}`.
    pub gift_serials_ok: bool,
    /// `Σ reserve − Σ unreserve − Σ spend − Σ refund == Σ active amounts`.
    pub reserved_ledger_matches_active_ok: bool,
    /// A terminal auction holds no active bids.
    pub no_active_bids_after_end_ok: bool,
    pub ok: bool,
}

fn ledger_sum(entries: &[LedgerEntry], entry_type: LedgerEntryType) -> u64 {
    entries
        .iter()
        .filter(|e| e.entry_type == entry_type)
        .map(|e| e.amount)
        .sum()
}

/// Run the global audit.
///
/// # Errors
/// Store errors only.
pub fn audit_global(store: &Store) -> Result<GlobalAudit> {
    store.with_txn(|txn| {
        let users = txn.all_users();
        let bids = txn.all_bids();

        let total_topups: u64 = users.iter().map(|u| u.total_topups).sum();
        let total_balances: u64 = users.iter().map(|u| u.balance.total()).sum();
        let money_conservation_ok = users.iter().all(|u| u.conserves_topups())
            && total_topups == total_balances;

        let total_reserved: u64 = users.iter().map(|u| u.balance.reserved).sum();
        let total_active: u64 = bids
            .iter()
            .filter(|b| b.status == BidStatus::Active)
            .map(|b| b.amount)
            .sum();
        let reserved_matches_active_bids_ok = total_reserved == total_active;

        let negative_balances_ok = true;

        Ok(GlobalAudit {
            user_count: users.len(),
            total_topups,
            total_balances,
            money_conservation_ok,
            reserved_matches_active_bids_ok,
            negative_balances_ok,
            ok: money_conservation_ok && reserved_matches_active_bids_ok && negative_balances_ok,
        })
    })
}

/// Run the per-auction audit.
///
/// # Errors
/// `NOT_FOUND` for an unknown auction.
pub fn audit_auction(store: &Store, auction_id: AuctionId) -> Result<AuctionAudit> {
    store.with_txn(|txn| {
        let auction = txn.auction(auction_id)?;
        let bids = txn.bids_for_auction(auction_id);
        let entries = txn.ledger_for_auction(auction_id);

        let spend_sum = ledger_sum(&entries, LedgerEntryType::Spend);
        let refund_sum = ledger_sum(&entries, LedgerEntryType::Refund);
        let reserve_sum = ledger_sum(&entries, LedgerEntryType::Reserve);
        let unreserve_sum = ledger_sum(&entries, LedgerEntryType::Unreserve);

        let won: Vec<_> = bids.iter().filter(|b| b.status == BidStatus::Won).collect();
        let paid_sum: u64 = won
            .iter()
            .filter_map(|b| b.settlement.map(|s| s.paid))
            .sum();
        let refunded_sum: u64 = won
            .iter()
            .filter_map(|b| b.settlement.map(|s| s.refunded))
            .sum();

        let revenue_matches_ledger_ok = auction.revenue == spend_sum;
        let paid_matches_ledger_ok = paid_sum == spend_sum;
        let refunded_matches_ledger_ok = refunded_sum == refund_sum;

        let awarded_count_matches_won_ok = auction.awarded_count as usize == won.len();

        let serials: Vec<u32> = won
            .iter()
            .filter_map(|b| b.settlement.map(|s| s.gift_serial))
            .collect();
        let unique: HashSet<u32> = serials.iter().copied().collect();
        let gift_serials_ok = unique.len() == serials.len()
            && serials.len() == auction.awarded_count as usize
            && (serials.is_empty()
                || (unique.iter().min() == Some(&1)
                    && unique.iter().max() == Some(&auction.awarded_count)));

        let active_sum: u64 = bids
            .iter()
            .filter(|b| b.status == BidStatus::Active)
            .map(|b| b.amount)
            .sum();
        let reserved_net = i128::from(reserve_sum)
            - i128::from(unreserve_sum)
            - i128::from(spend_sum)
            - i128::from(refund_sum);
        let reserved_ledger_matches_active_ok = reserved_net == i128::from(active_sum);

        let terminal = matches!(auction.state, AuctionState::Ended | AuctionState::Cancelled);
        let no_active_bids_after_end_ok =
            !terminal || bids.iter().all(|b| b.status != BidStatus::Active);

        let ok = revenue_matches_ledger_ok
            && paid_matches_ledger_ok
            && refunded_matches_ledger_ok
            && awarded_count_matches_won_ok
            && gift_serials_ok
            && reserved_ledger_matches_active_ok
            && no_active_bids_after_end_ok;

        Ok(AuctionAudit {
            auction_id,
            state: auction.state,
            revenue_matches_ledger_ok,
            paid_matches_ledger_ok,
            refunded_matches_ledger_ok,
            awarded_count_matches_won_ok,
            gift_serials_ok,
            reserved_ledger_matches_active_ok,
            no_active_bids_after_end_ok,
            ok,
        })
    })
}
