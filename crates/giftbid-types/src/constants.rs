//! System-wide constants for the Giftbid auction service.

/// Default round duration in milliseconds.
pub const DEFAULT_ROUND_DURATION_MS: u64 = 60_000;

/// Minimum round duration accepted at auction creation (5 seconds).
pub const MIN_ROUND_DURATION_MS: u64 = 5_000;

/// Maximum round duration accepted at auction creation (1 hour).
pub const MAX_ROUND_DURATION_MS: u64 = 3_600_000;

/// Default number of winners per round.
pub const DEFAULT_WINNERS_PER_ROUND: u32 = 10;

/// Default anti-snipe window in milliseconds.
pub const DEFAULT_ANTI_SNIPE_WINDOW_MS: u64 = 10_000;

/// Default anti-snipe extension in milliseconds.
pub const DEFAULT_ANTI_SNIPE_EXTEND_MS: u64 = 10_000;

/// Maximum anti-snipe window / extension (1 minute).
pub const MAX_ANTI_SNIPE_MS: u64 = 60_000;

/// Default auction deadline: 0 means no deadline.
pub const DEFAULT_MAX_DURATION_MS: u64 = 0;

/// Maximum auction deadline accepted at creation (7 days).
pub const MAX_AUCTION_DURATION_MS: u64 = 7 * 24 * 3_600_000;

/// Default number of consecutive empty rounds before the auction ends.
pub const DEFAULT_MAX_CONSECUTIVE_EMPTY_ROUNDS: u32 = 3;

/// Cap on the consecutive-empty-rounds setting.
pub const MAX_CONSECUTIVE_EMPTY_ROUNDS_CAP: u32 = 10_000;

/// Grace period before a round is considered due, absorbing clock jitter.
pub const CLOSE_GRACE_MS: u64 = 250;

/// Maximum auctions recovered / marked closing per engine tick.
pub const ENGINE_BATCH_LIMIT: usize = 5;

/// Maximum transparent retries for a transaction hitting transient conflicts.
pub const TXN_MAX_RETRIES: u32 = 5;

/// Default engine poll interval in milliseconds.
pub const DEFAULT_ENGINE_POLL_INTERVAL_MS: u64 = 200;

/// Minimum engine poll interval accepted from the environment.
pub const MIN_ENGINE_POLL_INTERVAL_MS: u64 = 50;

/// Floor on the leader-lock TTL in milliseconds.
pub const MIN_LOCK_TTL_MS: u64 = 2_000;

/// Leader-lock TTL as a multiple of the poll interval.
pub const LOCK_TTL_POLL_MULTIPLIER: u64 = 10;

/// Singleton document id for the engine leader lock.
pub const ENGINE_LOCK_ID: &str = "auctionEngine";

/// Leaderboard entries exposed by the snapshot.
pub const SNAPSHOT_LEADERBOARD_DISPLAY: usize = 20;

/// Upper bound on the leaderboard fetch inside the snapshot query.
pub const SNAPSHOT_LEADERBOARD_FETCH_MAX: usize = 200;

/// Recent settled rounds returned by the snapshot.
pub const SNAPSHOT_RECENT_ROUNDS: usize = 5;

/// Default API listen port.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name.
pub const SERVICE_NAME: &str = "Giftbid";
