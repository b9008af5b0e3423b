//! # giftbid-server
//!
//! HTTP surface for the **Giftbid** auction service: a thin axum layer
//! over `giftbid-core`. Handlers parse, delegate, and serialize; every
//! rule lives below. Errors keep their stable domain code and map to
//! the status line here.

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
