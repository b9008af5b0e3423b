//! The periodic engine task: recover, mark due rounds closing, settle.
//!
//! One tick does at most one lock-acquisition attempt and processes at
//! most [`ENGINE_BATCH_LIMIT`] auctions per phase, bounding the blast
//! radius of any single tick. A stop flag is honored before and after
//! every settlement; settlement itself is atomic and never interrupted
//! mid-transaction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{debug, error, trace};

use giftbid_core::Clock;
use giftbid_store::Store;
use giftbid_types::constants::{CLOSE_GRACE_MS, ENGINE_BATCH_LIMIT};
use giftbid_types::{
    Auction, AuctionId, AuctionState, ClosingToken, EngineConfig, Result, RoundState,
};

use crate::leader::LeaderElector;
use crate::settle::settle_closing_round;

/// What one tick did; returned for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether this process held the lock this tick.
    pub leader: bool,
    /// Interrupted closings picked up from a previous (crashed) leader.
    pub recovered: usize,
    /// Open rounds newly marked closing.
    pub marked_closing: usize,
    /// Settlements that committed a Round this tick.
    pub settled: usize,
}

/// Handle for stopping a running engine from outside.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    stopped: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Ask the engine to stop after the current settlement.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// The leader-elected round engine.
pub struct RoundEngine {
    store: Store,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    elector: LeaderElector,
    stopped: Arc<AtomicBool>,
}

impl RoundEngine {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let elector = LeaderElector::new(&config);
        Self {
            store,
            clock,
            config,
            elector,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for stopping this engine.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            stopped: Arc::clone(&self.stopped),
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// One engine tick. Safe to call from multiple processes; only the
    /// lock holder does work.
    pub fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();
        if !self.elector.try_acquire(&self.store, now) {
            trace!("not leader this tick");
            return report;
        }
        report.leader = true;

        // (a) Recover interrupted closings left behind by a crashed
        // leader: they still carry their token, so settlement resumes
        // exactly where it stopped.
        let interrupted = self.store.scan_auctions(
            |a| {
                a.state == AuctionState::Running
                    && a.round_state == Some(RoundState::Closing)
                    && a.closing_token.is_some()
            },
            ENGINE_BATCH_LIMIT,
        );
        for auction in interrupted {
            if self.is_stopped() {
                return report;
            }
            let Some(token) = auction.closing_token else {
                continue;
            };
            report.recovered += 1;
            self.settle(auction.id, token, &mut report);
            if self.is_stopped() {
                return report;
            }
        }

        // (b) Mark due open rounds as closing, then (c) settle each one
        // this tick locked.
        let now = self.clock.now();
        let due = self.store.scan_auctions(
            |a| {
                a.state == AuctionState::Running
                    && a.round_state == Some(RoundState::Open)
                    && is_due(a, now)
            },
            ENGINE_BATCH_LIMIT,
        );
        for auction in due {
            if self.is_stopped() {
                return report;
            }
            match mark_closing(&self.store, auction.id, self.clock.now()) {
                Ok(Some(token)) => {
                    report.marked_closing += 1;
                    self.settle(auction.id, token, &mut report);
                }
                // Another actor won the CAS or the round moved on.
                Ok(None) => {}
                Err(err) => error!(auction = %auction.id, %err, "failed to mark round closing"),
            }
            if self.is_stopped() {
                return report;
            }
        }

        report
    }

    fn settle(&self, auction_id: AuctionId, token: ClosingToken, report: &mut TickReport) {
        match settle_closing_round(&self.store, auction_id, token, self.clock.now()) {
            Ok(Some(_)) => report.settled += 1,
            Ok(None) => {}
            // The auction stays `closing` with its token; the next tick
            // retries the settlement.
            Err(err) => error!(auction = %auction_id, %err, "settlement failed"),
        }
    }

    /// Run ticks forever on the poll interval, until stopped.
    pub async fn run(self) {
        let mut interval =
            tokio::time::interval(StdDuration::from_millis(self.config.poll_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if self.is_stopped() {
                break;
            }
            let report = self.tick();
            if report.settled > 0 || report.recovered > 0 {
                debug!(?report, "engine tick");
            }
        }
        debug!("engine stopped");
    }
}

/// Whether the auction's current round (or the auction itself) is past
/// due, with the clock-jitter grace applied.
fn is_due(auction: &Auction, now: chrono::DateTime<chrono::Utc>) -> bool {
    let cutoff = now - Duration::milliseconds(CLOSE_GRACE_MS as i64);
    auction.round_ends_at.map_or(false, |end| end <= cutoff)
        || auction.ends_at.map_or(false, |end| end <= cutoff)
}

/// CAS an open, due round into `closing` with a fresh token.
///
/// Returns the token on success, `None` if the predicate no longer holds
/// (someone else got there first).
///
/// # Errors
/// Store errors after retry exhaustion.
fn mark_closing(
    store: &Store,
    auction_id: AuctionId,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Option<ClosingToken>> {
    store.with_txn(|txn| {
        let Some(mut auction) = txn.find_auction(auction_id) else {
            return Ok(None);
        };
        if auction.state != AuctionState::Running
            || auction.round_state != Some(RoundState::Open)
            || !is_due(&auction, now)
        {
            return Ok(None);
        }
        let token = ClosingToken::new();
        auction.round_state = Some(RoundState::Closing);
        auction.closing_token = Some(token);
        auction.closing_started_at = Some(now);
        auction.touch(now);
        txn.put_auction(auction);
        Ok(Some(token))
    })
}
