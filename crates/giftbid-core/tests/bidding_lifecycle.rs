//! Bidding lifecycle integration tests: concurrent placements racing on
//! the unique bid index, and the financial invariants holding after
//! every completed operation.

use std::thread;

use chrono::Utc;

use giftbid_core::{audit, auctions, bids, users, CreateAuction};
use giftbid_store::Store;
use giftbid_types::{Auction, AuctionConfig, AuctionId, UserId};

fn running_auction(store: &Store, quantity: u32) -> Auction {
    let now = Utc::now();
    let auction = auctions::create_auction(
        store,
        CreateAuction {
            title: "gifts".into(),
            total_quantity: quantity,
            config: AuctionConfig::default(),
        },
        now,
    )
    .unwrap();
    auctions::start_auction(store, auction.id, now).unwrap()
}

fn funded_user(store: &Store, amount: u64) -> UserId {
    let now = Utc::now();
    let user = users::create_user(store, now).unwrap();
    users::topup(store, user.id, amount, now).unwrap();
    user.id
}

fn assert_clean(store: &Store, auction_id: AuctionId) {
    let global = audit::audit_global(store).unwrap();
    assert!(global.ok, "global audit failed: {global:?}");
    let per = audit::audit_auction(store, auction_id).unwrap();
    assert!(per.ok, "auction audit failed: {per:?}");
}

// =============================================================================
// Concurrent first placements by the same user: exactly one wins
// =============================================================================
#[test]
fn concurrent_first_placements_one_succeeds() {
    let store = Store::new();
    let auction = running_auction(&store, 1);
    let user = funded_user(&store, 1_000);
    let now = Utc::now();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                scope.spawn(move || bids::place_bid(&store, auction.id, user, 100, now))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one placement must win the race");
    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one placement must lose");
    // The loser re-read the winner's bid: same amount is no longer a raise.
    assert_eq!(err.code(), "INVALID_INPUT");

    // Only one reservation happened.
    let balance = users::get_user(&store, user).unwrap().balance;
    assert_eq!(balance.available, 900);
    assert_eq!(balance.reserved, 100);
    assert_clean(&store, auction.id);
}

#[test]
fn concurrent_placement_and_raise_settle_monotonically() {
    let store = Store::new();
    let auction = running_auction(&store, 1);
    let user = funded_user(&store, 1_000);
    let now = Utc::now();

    // Two racing calls with different amounts: one lands as the first
    // placement, the other either raises past it or loses the monotone
    // check. Whatever the interleaving, the surviving bid must be one of
    // the two amounts and the reservation must match it exactly.
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = [100u64, 150]
            .into_iter()
            .map(|amount| {
                let store = store.clone();
                scope.spawn(move || bids::place_bid(&store, auction.id, user, amount, now))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().any(|r| r.is_ok()));
    let bid = store
        .with_txn(|txn| Ok(txn.find_bid_for(auction.id, user)))
        .unwrap()
        .expect("a bid must exist");
    assert!(bid.amount == 100 || bid.amount == 150);

    let balance = users::get_user(&store, user).unwrap().balance;
    assert_eq!(balance.reserved, bid.amount);
    assert_eq!(balance.available, 1_000 - bid.amount);
    assert_clean(&store, auction.id);
}

// =============================================================================
// Many bidders in parallel: reservations always equal active bids
// =============================================================================
#[test]
fn parallel_bidders_conserve_money() {
    let store = Store::new();
    let auction = running_auction(&store, 5);
    let bidders: Vec<UserId> = (0..3).map(|_| funded_user(&store, 10_000)).collect();
    let now = Utc::now();

    thread::scope(|scope| {
        for (i, user) in bidders.iter().enumerate() {
            let store = store.clone();
            let user = *user;
            scope.spawn(move || {
                let base = 100 * (i as u64 + 1);
                bids::place_bid(&store, auction.id, user, base, now).unwrap();
                bids::place_bid(&store, auction.id, user, base + 50, now).unwrap();
            });
        }
    });

    for user in &bidders {
        let balance = users::get_user(&store, *user).unwrap().balance;
        assert_eq!(balance.available + balance.reserved, 10_000);
    }
    assert_clean(&store, auction.id);
}

// =============================================================================
// Invariants hold after every step of a mixed lifecycle
// =============================================================================
#[test]
fn invariants_hold_step_by_step() {
    let store = Store::new();
    let auction = running_auction(&store, 3);
    let now = Utc::now();

    let alice = funded_user(&store, 2_000);
    assert_clean(&store, auction.id);

    bids::place_bid(&store, auction.id, alice, 300, now).unwrap();
    assert_clean(&store, auction.id);

    bids::place_bid(&store, auction.id, alice, 700, now).unwrap();
    assert_clean(&store, auction.id);

    let bob = funded_user(&store, 500);
    bids::place_bid(&store, auction.id, bob, 450, now).unwrap();
    assert_clean(&store, auction.id);

    bids::withdraw_bid(&store, auction.id, alice, now).unwrap();
    assert_clean(&store, auction.id);

    // Alice comes back at a lower amount than her withdrawn bid.
    bids::place_bid(&store, auction.id, alice, 100, now).unwrap();
    assert_clean(&store, auction.id);

    auctions::cancel_auction(&store, auction.id, now).unwrap();
    assert_clean(&store, auction.id);

    // R2: everything reserved came back; nothing was spent.
    for user in [alice, bob] {
        let u = users::get_user(&store, user).unwrap();
        assert_eq!(u.balance.available, u.total_topups);
        assert_eq!(u.balance.reserved, 0);
        assert_eq!(u.balance.spent, 0);
    }
}

// =============================================================================
// A failed operation leaves the audit unchanged
// =============================================================================
#[test]
fn failed_operations_leave_no_partial_state() {
    let store = Store::new();
    let auction = running_auction(&store, 1);
    let user = funded_user(&store, 100);
    let now = Utc::now();

    // Insufficient funds.
    assert!(bids::place_bid(&store, auction.id, user, 1_000, now).is_err());
    assert_clean(&store, auction.id);

    // Withdraw without a bid.
    assert!(bids::withdraw_bid(&store, auction.id, user, now).is_err());
    assert_clean(&store, auction.id);

    // Top-up of an unknown user.
    assert!(users::topup(&store, UserId::new(), 50, now).is_err());
    assert_clean(&store, auction.id);

    let balance = users::get_user(&store, user).unwrap().balance;
    assert_eq!(balance.available, 100);
    assert_eq!(balance.reserved, 0);
}
