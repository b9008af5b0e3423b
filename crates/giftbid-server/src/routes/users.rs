//! User endpoints: create, read, top-up.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use giftbid_types::{Balance, UserId};

use crate::error::ApiResult;
use crate::routes::parse_uuid;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub balance: Balance,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: UserId,
    pub balance: Balance,
    pub total_topups: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupBody {
    pub amount: u64,
}

pub async fn create_user(State(state): State<AppState>) -> ApiResult<Json<UserSummary>> {
    let user = giftbid_core::create_user(&state.store, state.clock.now())?;
    Ok(Json(UserSummary {
        id: user.id,
        balance: user.balance,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    let user_id = UserId(parse_uuid(&id)?);
    let user = giftbid_core::get_user(&state.store, user_id)?;
    Ok(Json(UserDetail {
        id: user.id,
        balance: user.balance,
        total_topups: user.total_topups,
    }))
}

pub async fn topup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TopupBody>,
) -> ApiResult<Json<UserSummary>> {
    let user_id = UserId(parse_uuid(&id)?);
    let user = giftbid_core::topup(&state.store, user_id, body.amount, state.clock.now())?;
    Ok(Json(UserSummary {
        id: user.id,
        balance: user.balance,
    }))
}
