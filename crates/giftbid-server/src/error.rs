//! Domain error → HTTP response mapping.
//!
//! Domain errors carry their stable code through unchanged; this layer
//! only decides the status line and the JSON envelope:
//! `{ "error": …, "code": …, "details"?: … }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use giftbid_types::GiftbidError;

/// Wrapper giving [`GiftbidError`] an [`IntoResponse`] impl.
#[derive(Debug)]
pub struct ApiError(pub GiftbidError);

impl From<GiftbidError> for ApiError {
    fn from(err: GiftbidError) -> Self {
        Self(err)
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GiftbidError::InvalidId { .. } | GiftbidError::InvalidInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            GiftbidError::NotFound { .. } => StatusCode::NOT_FOUND,
            GiftbidError::NotStartable { .. }
            | GiftbidError::NotCancellable { .. }
            | GiftbidError::NotOpen
            | GiftbidError::RoundEnded
            | GiftbidError::BidNotActive { .. }
            | GiftbidError::InsufficientFunds { .. } => StatusCode::CONFLICT,
            GiftbidError::TransientConflict
            | GiftbidError::DuplicateKey { .. }
            | GiftbidError::InvariantViolation { .. }
            | GiftbidError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(code = self.0.code(), err = %self.0, "request failed");
        }

        let mut body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });
        if let GiftbidError::InsufficientFunds { needed, available } = &self.0 {
            body["details"] = json!({ "needed": needed, "available": available });
        }

        (status, axum::Json(body)).into_response()
    }
}
