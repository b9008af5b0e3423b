//! End-to-end round lifecycle tests through real engine ticks.
//!
//! A manual clock drives the rounds: bids land, time passes, the engine
//! marks due rounds closing and settles them, and the audit must come
//! back all-true after every scenario — including leader crashes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use giftbid_core::{audit, auctions, bids, users, Clock, CreateAuction, ManualClock};
use giftbid_engine::{settle_closing_round, RoundEngine};
use giftbid_store::Store;
use giftbid_types::{
    Auction, AuctionConfig, AuctionId, AuctionState, BidStatus, ClosingToken, EndReason,
    EngineConfig, RoundState, UserId,
};

/// Harness: store + manual clock + engine, with scenario helpers.
struct Rig {
    store: Store,
    clock: Arc<ManualClock>,
    engine: RoundEngine,
}

impl Rig {
    fn new() -> Self {
        let store = Store::new();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = RoundEngine::new(store.clone(), clock.clone(), EngineConfig::default());
        Self {
            store,
            clock,
            engine,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn start_auction(&self, quantity: u32, config: AuctionConfig) -> Auction {
        let auction = auctions::create_auction(
            &self.store,
            CreateAuction {
                title: "numbered gifts".into(),
                total_quantity: quantity,
                config,
            },
            self.now(),
        )
        .unwrap();
        auctions::start_auction(&self.store, auction.id, self.now()).unwrap()
    }

    fn funded_bidder(&self, topup: u64, auction: AuctionId, amount: u64) -> UserId {
        let user = users::create_user(&self.store, self.now()).unwrap();
        users::topup(&self.store, user.id, topup, self.now()).unwrap();
        bids::place_bid(&self.store, auction, user.id, amount, self.now()).unwrap();
        user.id
    }

    /// Advance past the round end (plus the due grace) and tick.
    fn close_round(&self, ms_past_end: u64) -> giftbid_engine::TickReport {
        self.clock.advance_ms(ms_past_end);
        self.engine.tick()
    }

    fn auction(&self, id: AuctionId) -> Auction {
        auctions::get_auction(&self.store, id).unwrap()
    }

    fn balance(&self, user: UserId) -> (u64, u64, u64) {
        let b = users::get_user(&self.store, user).unwrap().balance;
        (b.available, b.reserved, b.spent)
    }

    fn assert_audit_clean(&self, auction_id: AuctionId) {
        let global = audit::audit_global(&self.store).unwrap();
        assert!(global.ok, "global audit failed: {global:?}");
        let per = audit::audit_auction(&self.store, auction_id).unwrap();
        assert!(per.ok, "auction audit failed: {per:?}");
    }
}

fn five_second_rounds() -> AuctionConfig {
    AuctionConfig {
        round_duration_ms: 5_000,
        anti_snipe_window_ms: 0,
        ..AuctionConfig::default()
    }
}

// =============================================================================
// Scenario: one gift, three bidders, one round
// =============================================================================
#[test]
fn e2e_single_gift_single_round() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        1,
        AuctionConfig {
            winners_per_round: 1,
            ..five_second_rounds()
        },
    );

    let u1 = rig.funded_bidder(1_000, auction.id, 100);
    let u2 = rig.funded_bidder(1_000, auction.id, 90);
    let u3 = rig.funded_bidder(1_000, auction.id, 80);

    let report = rig.close_round(5_300);
    assert!(report.leader);
    assert_eq!(report.marked_closing, 1);
    assert_eq!(report.settled, 1);

    // Winner pays the clearing price (their own bid: they are the k-th).
    assert_eq!(rig.balance(u1), (900, 0, 100));
    // Losers are fully restored.
    assert_eq!(rig.balance(u2), (1_000, 0, 0));
    assert_eq!(rig.balance(u3), (1_000, 0, 0));

    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(ended.end_reason, Some(EndReason::SoldOut));
    assert_eq!(ended.revenue, 100);
    assert_eq!(ended.awarded_count, 1);
    assert!(ended.round_state.is_none());
    assert!(ended.closing_token.is_none());

    let rounds = rig
        .store
        .with_txn(|txn| Ok(txn.rounds_for_auction(auction.id)))
        .unwrap();
    assert_eq!(rounds.len(), 1);
    let round = &rounds[0];
    assert_eq!(round.round_number, 1);
    assert_eq!(round.clearing_price, 100);
    assert_eq!(round.winners.len(), 1);
    assert_eq!(round.winners[0].user_id, u1);
    assert_eq!(round.winners[0].gift_serial, 1);
    assert_eq!(round.winners[0].paid, 100);
    assert_eq!(round.winners[0].refunded, 0);

    // Loser bids are marked lost.
    let statuses: Vec<BidStatus> = rig
        .store
        .with_txn(|txn| {
            Ok(vec![
                txn.find_bid_for(auction.id, u2).unwrap().status,
                txn.find_bid_for(auction.id, u3).unwrap().status,
            ])
        })
        .unwrap();
    assert_eq!(statuses, vec![BidStatus::Lost, BidStatus::Lost]);

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Scenario: uniform clearing price with a refund for the top bidder
// =============================================================================
#[test]
fn e2e_uniform_price_refunds_surplus() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        2,
        AuctionConfig {
            winners_per_round: 2,
            ..five_second_rounds()
        },
    );

    let u1 = rig.funded_bidder(1_000, auction.id, 30);
    let u2 = rig.funded_bidder(1_000, auction.id, 20);
    let u3 = rig.funded_bidder(1_000, auction.id, 10);

    rig.close_round(5_300);

    // Clearing price is the 2nd winner's bid: 20.
    assert_eq!(rig.balance(u1), (980, 0, 20));
    assert_eq!(rig.balance(u2), (980, 0, 20));
    assert_eq!(rig.balance(u3), (1_000, 0, 0));

    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(ended.end_reason, Some(EndReason::SoldOut));
    assert_eq!(ended.revenue, 40);

    let rounds = rig
        .store
        .with_txn(|txn| Ok(txn.rounds_for_auction(auction.id)))
        .unwrap();
    assert_eq!(rounds[0].clearing_price, 20);
    assert_eq!(rounds[0].winners[0].refunded, 10);
    assert_eq!(rounds[0].winners[1].refunded, 0);

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Scenario: more winners configured than gifts remaining
// =============================================================================
#[test]
fn e2e_last_round_awards_only_remaining() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        3,
        AuctionConfig {
            winners_per_round: 2,
            ..five_second_rounds()
        },
    );

    rig.funded_bidder(1_000, auction.id, 30);
    rig.funded_bidder(1_000, auction.id, 20);
    let u3 = rig.funded_bidder(1_000, auction.id, 10);

    // Round 1: two gifts awarded, one bidder left active.
    rig.close_round(5_300);
    let mid = rig.auction(auction.id);
    assert_eq!(mid.state, AuctionState::Running);
    assert_eq!(mid.awarded_count, 2);
    assert_eq!(mid.current_round, 2);
    assert_eq!(mid.round_state, Some(RoundState::Open));

    // Round 2: only one gift remains, so k = 1 despite winnersPerRound=2.
    rig.close_round(5_300);
    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(ended.end_reason, Some(EndReason::SoldOut));
    assert_eq!(ended.awarded_count, 3);

    // u3 won the last gift at their own bid.
    assert_eq!(rig.balance(u3), (990, 0, 10));

    // Serials across both rounds are exactly 1..=3.
    let rounds = rig
        .store
        .with_txn(|txn| Ok(txn.rounds_for_auction(auction.id)))
        .unwrap();
    let mut serials: Vec<u32> = rounds
        .iter()
        .flat_map(|r| r.winners.iter().map(|w| w.gift_serial))
        .collect();
    serials.sort_unstable();
    assert_eq!(serials, vec![1, 2, 3]);

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Scenario: consecutive empty rounds end the auction
// =============================================================================
#[test]
fn e2e_empty_rounds_end_auction() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        1,
        AuctionConfig {
            winners_per_round: 1,
            max_consecutive_empty_rounds: 2,
            ..five_second_rounds()
        },
    );

    // Round 1 closes with no bids: the auction rolls on.
    rig.close_round(5_300);
    let mid = rig.auction(auction.id);
    assert_eq!(mid.state, AuctionState::Running);
    assert_eq!(mid.consecutive_empty_rounds, 1);
    assert_eq!(mid.current_round, 2);

    // Round 2 also empty: limit reached.
    rig.close_round(5_300);
    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(ended.end_reason, Some(EndReason::EmptyRounds));
    assert_eq!(ended.awarded_count, 0);
    assert_eq!(ended.revenue, 0);

    let rounds = rig
        .store
        .with_txn(|txn| Ok(txn.rounds_for_auction(auction.id)))
        .unwrap();
    assert_eq!(rounds.len(), 2);
    assert!(rounds.iter().all(|r| r.winners.is_empty()));
    assert!(rounds.iter().all(|r| r.clearing_price == 0));

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Scenario: a bid resets the empty-round streak
// =============================================================================
#[test]
fn e2e_winning_round_resets_empty_streak() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        2,
        AuctionConfig {
            winners_per_round: 1,
            max_consecutive_empty_rounds: 2,
            ..five_second_rounds()
        },
    );

    // Round 1: empty.
    rig.close_round(5_300);
    assert_eq!(rig.auction(auction.id).consecutive_empty_rounds, 1);

    // Round 2: one bid lands, streak resets.
    rig.funded_bidder(100, auction.id, 50);
    rig.close_round(5_300);
    let mid = rig.auction(auction.id);
    assert_eq!(mid.consecutive_empty_rounds, 0);
    assert_eq!(mid.awarded_count, 1);
    assert_eq!(mid.state, AuctionState::Running);

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Scenario: the auction deadline wins over the round clock
// =============================================================================
#[test]
fn e2e_max_duration_ends_auction() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        5,
        AuctionConfig {
            winners_per_round: 1,
            max_duration_ms: 10_000,
            ..five_second_rounds()
        },
    );

    rig.funded_bidder(1_000, auction.id, 40);
    rig.close_round(5_300);
    let mid = rig.auction(auction.id);
    assert_eq!(mid.state, AuctionState::Running);
    // Round 2's end is clamped to the auction deadline.
    assert_eq!(mid.round_ends_at, Some(mid.ends_at.unwrap()));

    rig.funded_bidder(1_000, auction.id, 60);
    rig.close_round(5_300);
    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(ended.end_reason, Some(EndReason::MaxDuration));
    assert_eq!(ended.awarded_count, 2);

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Crash recovery: a closing round left behind is resumed by the next leader
// =============================================================================
#[test]
fn e2e_crashed_leader_recovery() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        1,
        AuctionConfig {
            winners_per_round: 1,
            ..five_second_rounds()
        },
    );
    let u1 = rig.funded_bidder(1_000, auction.id, 100);
    rig.clock.advance_ms(5_300);

    // A leader marked the round closing, then died before settling:
    // the row keeps `closing` and its token.
    let token = ClosingToken::new();
    let now = rig.now();
    rig.store
        .with_txn(|txn| {
            let mut a = txn.auction(auction.id)?;
            a.round_state = Some(RoundState::Closing);
            a.closing_token = Some(token);
            a.closing_started_at = Some(now);
            a.touch(now);
            txn.put_auction(a);
            Ok(())
        })
        .unwrap();

    // A fresh engine process takes the lock and recovers the closing.
    let successor = RoundEngine::new(
        rig.store.clone(),
        rig.clock.clone(),
        EngineConfig::default(),
    );
    let report = successor.tick();
    assert!(report.leader);
    assert_eq!(report.recovered, 1);
    assert_eq!(report.settled, 1);

    let ended = rig.auction(auction.id);
    assert_eq!(ended.state, AuctionState::Ended);
    assert_eq!(rig.balance(u1), (900, 0, 100));
    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Idempotence: re-running settlement with the surviving token is a no-op
// =============================================================================
#[test]
fn e2e_settlement_is_idempotent() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        1,
        AuctionConfig {
            winners_per_round: 1,
            ..five_second_rounds()
        },
    );
    let u1 = rig.funded_bidder(1_000, auction.id, 100);
    rig.clock.advance_ms(5_300);

    let token = ClosingToken::new();
    let now = rig.now();
    rig.store
        .with_txn(|txn| {
            let mut a = txn.auction(auction.id)?;
            a.round_state = Some(RoundState::Closing);
            a.closing_token = Some(token);
            a.closing_started_at = Some(now);
            a.touch(now);
            txn.put_auction(a);
            Ok(())
        })
        .unwrap();

    let first = settle_closing_round(&rig.store, auction.id, token, rig.now()).unwrap();
    assert!(first.is_some());
    let after_first = rig.auction(auction.id);

    // Same token again: the fence no longer matches; nothing changes.
    let second = settle_closing_round(&rig.store, auction.id, token, rig.now()).unwrap();
    assert!(second.is_none());
    assert_eq!(rig.auction(auction.id), after_first);
    assert_eq!(rig.balance(u1), (900, 0, 100));

    // A stale token never settles.
    let third =
        settle_closing_round(&rig.store, auction.id, ClosingToken::new(), rig.now()).unwrap();
    assert!(third.is_none());

    rig.assert_audit_clean(auction.id);
}

// =============================================================================
// Leadership: only one engine drives; a stopped engine settles nothing
// =============================================================================
#[test]
fn e2e_single_leader_per_tick() {
    let rig = Rig::new();
    let other = RoundEngine::new(
        rig.store.clone(),
        rig.clock.clone(),
        EngineConfig::default(),
    );

    let first = rig.engine.tick();
    assert!(first.leader);
    let second = other.tick();
    assert!(!second.leader);
}

#[test]
fn e2e_stopped_engine_does_not_settle() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        1,
        AuctionConfig {
            winners_per_round: 1,
            ..five_second_rounds()
        },
    );
    rig.funded_bidder(1_000, auction.id, 100);

    rig.engine.handle().stop();
    let report = rig.close_round(5_300);
    assert_eq!(report.marked_closing, 0);
    assert_eq!(report.settled, 0);
    assert_eq!(rig.auction(auction.id).state, AuctionState::Running);
}

// =============================================================================
// Rolling rounds: losers carry over, raises keep working
// =============================================================================
#[test]
fn e2e_active_bids_carry_into_next_round() {
    let rig = Rig::new();
    let auction = rig.start_auction(
        3,
        AuctionConfig {
            winners_per_round: 1,
            ..five_second_rounds()
        },
    );

    let u1 = rig.funded_bidder(1_000, auction.id, 100);
    let u2 = rig.funded_bidder(1_000, auction.id, 90);

    rig.close_round(5_300);
    let mid = rig.auction(auction.id);
    assert_eq!(mid.awarded_count, 1);
    assert_eq!(mid.current_round, 2);

    // u2's bid is still active and wins round 2 unopposed at its own
    // amount; u1's settled bid cannot be raised.
    let err = bids::place_bid(&rig.store, auction.id, u1, 500, rig.now()).unwrap_err();
    assert_eq!(err.code(), "BID_NOT_ACTIVE");

    rig.close_round(5_300);
    let after = rig.auction(auction.id);
    assert_eq!(after.awarded_count, 2);
    assert_eq!(rig.balance(u2), (910, 0, 90));

    rig.assert_audit_clean(auction.id);
}
