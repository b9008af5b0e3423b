//! Auction endpoints: lifecycle, snapshot, bidding, audit.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use giftbid_core::{AuctionAudit, AuctionSnapshot, CreateAuction, GlobalAudit};
use giftbid_types::{Auction, AuctionConfig, AuctionId, Bid, UserId};

use crate::error::ApiResult;
use crate::routes::parse_uuid;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionBody {
    pub title: String,
    pub total_quantity: u32,
    #[serde(default)]
    pub config: AuctionConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAuction {
    pub id: AuctionId,
    pub auction: Auction,
}

#[derive(Debug, Serialize)]
pub struct AuctionEnvelope {
    pub auction: Auction,
}

#[derive(Debug, Serialize)]
pub struct AuctionList {
    pub auctions: Vec<Auction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidBody {
    pub user_id: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawBody {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct BidPlaced {
    pub auction: Auction,
    pub bid: Bid,
}

#[derive(Debug, Serialize)]
pub struct BidEnvelope {
    pub bid: Bid,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateAuctionBody>,
) -> ApiResult<Json<CreatedAuction>> {
    let auction = giftbid_core::create_auction(
        &state.store,
        CreateAuction {
            title: body.title,
            total_quantity: body.total_quantity,
            config: body.config,
        },
        state.clock.now(),
    )?;
    Ok(Json(CreatedAuction {
        id: auction.id,
        auction,
    }))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<AuctionList>> {
    let auctions = giftbid_core::list_auctions(&state.store)?;
    Ok(Json(AuctionList { auctions }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuctionEnvelope>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let auction = giftbid_core::get_auction(&state.store, auction_id)?;
    Ok(Json(AuctionEnvelope { auction }))
}

pub async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuctionEnvelope>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let auction = giftbid_core::start_auction(&state.store, auction_id, state.clock.now())?;
    Ok(Json(AuctionEnvelope { auction }))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuctionEnvelope>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let auction = giftbid_core::cancel_auction(&state.store, auction_id, state.clock.now())?;
    Ok(Json(AuctionEnvelope { auction }))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<Json<AuctionSnapshot>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let user_id = match query.user_id {
        Some(raw) => Some(UserId(parse_uuid(&raw)?)),
        None => None,
    };
    let snapshot =
        giftbid_core::snapshot(&state.store, auction_id, user_id, state.clock.now())?;
    Ok(Json(snapshot))
}

pub async fn place_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PlaceBidBody>,
) -> ApiResult<Json<BidPlaced>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let user_id = UserId(parse_uuid(&body.user_id)?);
    let (auction, bid) = giftbid_core::place_bid(
        &state.store,
        auction_id,
        user_id,
        body.amount,
        state.clock.now(),
    )?;
    Ok(Json(BidPlaced { auction, bid }))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<WithdrawBody>,
) -> ApiResult<Json<BidEnvelope>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let user_id = UserId(parse_uuid(&body.user_id)?);
    let bid = giftbid_core::withdraw_bid(&state.store, auction_id, user_id, state.clock.now())?;
    Ok(Json(BidEnvelope { bid }))
}

pub async fn audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuctionAudit>> {
    let auction_id = AuctionId(parse_uuid(&id)?);
    let report = giftbid_core::audit_auction(&state.store, auction_id)?;
    Ok(Json(report))
}

pub async fn audit_global(State(state): State<AppState>) -> ApiResult<Json<GlobalAudit>> {
    let report = giftbid_core::audit_global(&state.store)?;
    Ok(Json(report))
}
