//! Configuration types for auctions, the round engine, and the server.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Per-auction round and lifecycle configuration.
///
/// Values are clamped at auction creation via [`AuctionConfig::clamped`];
/// a stored auction always carries an in-range config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AuctionConfig {
    /// Round length in milliseconds.
    pub round_duration_ms: u64,
    /// Up to this many winners are selected when a round closes.
    pub winners_per_round: u32,
    /// A bid landing within this window of the round end triggers an extension.
    pub anti_snipe_window_ms: u64,
    /// How far past `now` the round end is pushed by an anti-snipe extension.
    pub anti_snipe_extend_ms: u64,
    /// Absolute auction deadline relative to start; 0 disables the deadline.
    pub max_duration_ms: u64,
    /// Consecutive winnerless rounds before the auction ends; 0 disables.
    pub max_consecutive_empty_rounds: u32,
    /// Reserved. Clamped to 1 at creation and not otherwise consulted.
    pub max_wins_per_user: u32,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            round_duration_ms: constants::DEFAULT_ROUND_DURATION_MS,
            winners_per_round: constants::DEFAULT_WINNERS_PER_ROUND,
            anti_snipe_window_ms: constants::DEFAULT_ANTI_SNIPE_WINDOW_MS,
            anti_snipe_extend_ms: constants::DEFAULT_ANTI_SNIPE_EXTEND_MS,
            max_duration_ms: constants::DEFAULT_MAX_DURATION_MS,
            max_consecutive_empty_rounds: constants::DEFAULT_MAX_CONSECUTIVE_EMPTY_ROUNDS,
            max_wins_per_user: 1,
        }
    }
}

impl AuctionConfig {
    /// Clamp every field into its accepted range for an auction of
    /// `total_quantity` items.
    #[must_use]
    pub fn clamped(self, total_quantity: u32) -> Self {
        Self {
            round_duration_ms: self.round_duration_ms.clamp(
                constants::MIN_ROUND_DURATION_MS,
                constants::MAX_ROUND_DURATION_MS,
            ),
            winners_per_round: self.winners_per_round.clamp(1, total_quantity.max(1)),
            anti_snipe_window_ms: self.anti_snipe_window_ms.min(constants::MAX_ANTI_SNIPE_MS),
            anti_snipe_extend_ms: self.anti_snipe_extend_ms.min(constants::MAX_ANTI_SNIPE_MS),
            max_duration_ms: self.max_duration_ms.min(constants::MAX_AUCTION_DURATION_MS),
            max_consecutive_empty_rounds: self
                .max_consecutive_empty_rounds
                .min(constants::MAX_CONSECUTIVE_EMPTY_ROUNDS_CAP),
            max_wins_per_user: 1,
        }
    }
}

/// Round engine timing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_ENGINE_POLL_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Read `ENGINE_POLL_INTERVAL_MS` from the environment; values below
    /// the minimum (or unparseable) fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let poll_interval_ms = std::env::var("ENGINE_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&ms| ms >= constants::MIN_ENGINE_POLL_INTERVAL_MS)
            .unwrap_or(constants::DEFAULT_ENGINE_POLL_INTERVAL_MS);
        Self { poll_interval_ms }
    }

    /// Leader-lock TTL: `max(2 s, 10 × poll interval)`.
    #[must_use]
    pub fn lock_ttl_ms(&self) -> u64 {
        constants::MIN_LOCK_TTL_MS
            .max(self.poll_interval_ms * constants::LOCK_TTL_POLL_MULTIPLIER)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on (1..=65535).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: constants::DEFAULT_API_PORT,
        }
    }
}

impl ServerConfig {
    /// Create config from `HOST` / `PORT` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .filter(|&p| p > 0)
            .unwrap_or(constants::DEFAULT_API_PORT);
        Self { host, port }
    }

    /// Socket address string for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
