//! Axum application builder.
//!
//! Configures routes, middleware, and state for the server. Route logic
//! lives in the `routes` modules; this file only wires them together.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{auctions, health, users};
use crate::state::AppState;

/// Create the Axum application with all routes.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id/topup", post(users::topup))
        .route("/api/auctions", post(auctions::create).get(auctions::list))
        .route("/api/auctions/:id", get(auctions::get))
        .route("/api/auctions/:id/start", post(auctions::start))
        .route("/api/auctions/:id/cancel", post(auctions::cancel))
        .route("/api/auctions/:id/snapshot", get(auctions::get_snapshot))
        .route("/api/auctions/:id/bids", post(auctions::place_bid))
        .route("/api/auctions/:id/withdraw", post(auctions::withdraw))
        .route("/api/auctions/:id/audit", get(auctions::audit))
        .route("/api/audit", get(auctions::audit_global))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use giftbid_core::SystemClock;
    use giftbid_store::Store;

    use super::*;

    #[test]
    fn app_builds() {
        let state = AppState::new(Store::new(), Arc::new(SystemClock));
        let _app = create_app(state);
    }
}
