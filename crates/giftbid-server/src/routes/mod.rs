//! Route handlers, grouped by resource.

pub mod auctions;
pub mod health;
pub mod users;

use uuid::Uuid;

use giftbid_types::GiftbidError;

use crate::error::ApiError;

/// Parse a path id; failures surface as `INVALID_ID` → 400.
pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError(GiftbidError::InvalidId {
            reason: format!("not a valid id: {raw}"),
        })
    })
}
