//! # giftbid-engine
//!
//! The leader-elected round engine for the **Giftbid** auction service.
//!
//! A periodic tick, run by whichever process holds the engine lock:
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   RECOVER    │───▶│ MARK CLOSING │───▶│    SETTLE    │──┐
//! │              │    │              │    │              │  │
//! │ closing rows │    │ due rounds → │    │ winners paid,│  │
//! │ with tokens  │    │ CAS + token  │    │ Round insert │  │
//! └──────────────┘    └──────────────┘    └──────────────┘  │
//!        ▲                                                  │
//!        └──────────────── next tick ◀──────────────────────┘
//! ```
//!
//! Crash safety rests on two fences: the `closingToken` (a round is
//! settled by at most one worker) and the unique `(auction, roundNumber)`
//! index on Round receipts (a round is settled at most once). A leader
//! that dies mid-settlement leaves the row in `closing`; the next leader
//! resumes it and either commits or discovers the receipt already there.

pub mod engine;
pub mod leader;
pub mod settle;

pub use engine::{EngineHandle, RoundEngine, TickReport};
pub use leader::LeaderElector;
pub use settle::settle_closing_round;
