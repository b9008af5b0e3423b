//! Shared handler state.

use std::sync::Arc;

use giftbid_core::Clock;
use giftbid_store::Store;

/// Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}
