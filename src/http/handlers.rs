//! Request handlers
//!
//! Handlers are thin: decode the request, call the platform, encode the
//! result. Bodies and responses use camelCase; amounts are minor units.

use super::caller::Caller;
use super::error::ApiError;
use crate::core::admin::Adjustment;
use crate::core::ledger::Reconciliation;
use crate::core::platform::{WalletPlatform, WalletStats};
use crate::core::withdrawal::WithdrawalFilter;
use crate::types::{
    AutoRechargeSettings, EntryType, Minor, Order, OrderId, Pagination, PayoutMethodId,
    UserId, Wallet, WalletTransaction, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
    ZenStatus,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalBody {
    pub payout_method_id: PayoutMethodId,
    pub amount: Minor,
    pub user_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBody {
    pub amount: Minor,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub reason: String,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZenStatusBody {
    pub zen_status: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalStatusBody {
    pub status: String,
    pub admin_note: Option<String>,
    pub tx_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalNotesBody {
    pub admin_note: Option<String>,
    pub tx_ref: Option<String>,
}

/// Query string of the admin withdrawal listing
///
/// The status stays a string so an unknown value maps to `INVALID_STATUS`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalQuery {
    pub status: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub order: Order,
    pub previous_status: ZenStatus,
    pub wallet_transaction: Option<WalletTransaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalStatusResponse {
    pub withdrawal: WithdrawalRequest,
    pub previous_status: WithdrawalStatus,
    pub reversal_transaction: Option<WalletTransaction>,
}

pub async fn get_wallet(State(platform): State<WalletPlatform>, caller: Caller) -> ApiResult<Wallet> {
    Ok(Json(platform.wallets().wallet(caller.id())?))
}

pub async fn update_settings(
    State(platform): State<WalletPlatform>,
    caller: Caller,
    Json(settings): Json<AutoRechargeSettings>,
) -> ApiResult<Wallet> {
    Ok(Json(platform.update_settings(caller.id(), settings)?))
}

pub async fn list_transactions(
    State(platform): State<WalletPlatform>,
    caller: Caller,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<WalletTransaction>> {
    Ok(Json(platform.ledger().list_for_user(caller.id(), pagination)))
}

pub async fn request_withdrawal(
    State(platform): State<WalletPlatform>,
    caller: Caller,
    Json(body): Json<WithdrawalBody>,
) -> Result<(StatusCode, Json<WithdrawalRequest>), ApiError> {
    let request = platform.request_withdrawal(
        caller.id(),
        body.payout_method_id,
        body.amount,
        body.user_note.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn adjust_wallet(
    State(platform): State<WalletPlatform>,
    caller: Caller,
    Path(user_id): Path<UserId>,
    Json(body): Json<AdjustBody>,
) -> ApiResult<Adjustment> {
    let adjustment = platform.adjust(
        caller.actor(),
        user_id,
        body.amount,
        body.entry_type,
        &body.reason,
        body.reference.as_deref(),
    )?;
    Ok(Json(adjustment))
}

pub async fn user_transactions(
    State(platform): State<WalletPlatform>,
    Path(user_id): Path<UserId>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Vec<WalletTransaction>> {
    Ok(Json(platform.ledger().list_for_user(user_id, pagination)))
}

pub async fn reconcile(
    State(platform): State<WalletPlatform>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Reconciliation> {
    Ok(Json(platform.reconcile(user_id)?))
}

pub async fn wallet_stats(State(platform): State<WalletPlatform>) -> Json<WalletStats> {
    Json(platform.stats())
}

pub async fn update_order_status(
    State(platform): State<WalletPlatform>,
    caller: Caller,
    Path(order_id): Path<OrderId>,
    Json(body): Json<ZenStatusBody>,
) -> ApiResult<OrderStatusResponse> {
    let outcome = platform.transition_order(
        order_id,
        &body.zen_status,
        caller.actor(),
        body.note.as_deref(),
    )?;
    Ok(Json(OrderStatusResponse {
        order: outcome.order,
        previous_status: outcome.previous,
        wallet_transaction: outcome.wallet_entry,
    }))
}

pub async fn list_withdrawals(
    State(platform): State<WalletPlatform>,
    Query(query): Query<WithdrawalQuery>,
) -> ApiResult<Vec<WithdrawalRequest>> {
    let status = query
        .status
        .as_deref()
        .filter(|status| !status.trim().is_empty())
        .map(str::parse::<WithdrawalStatus>)
        .transpose()?;

    Ok(Json(platform.withdrawals().list(WithdrawalFilter {
        status,
        user_id: query.user_id,
    })))
}

pub async fn get_withdrawal(
    State(platform): State<WalletPlatform>,
    Path(id): Path<WithdrawalId>,
) -> ApiResult<WithdrawalRequest> {
    Ok(Json(platform.withdrawals().get(id)?))
}

pub async fn update_withdrawal_status(
    State(platform): State<WalletPlatform>,
    Path(id): Path<WithdrawalId>,
    Json(body): Json<WithdrawalStatusBody>,
) -> ApiResult<WithdrawalStatusResponse> {
    let change = platform.update_withdrawal(
        id,
        &body.status,
        body.admin_note.as_deref(),
        body.tx_ref.as_deref(),
    )?;
    Ok(Json(WithdrawalStatusResponse {
        withdrawal: change.request,
        previous_status: change.previous,
        reversal_transaction: change.reversal,
    }))
}

pub async fn annotate_withdrawal(
    State(platform): State<WalletPlatform>,
    Path(id): Path<WithdrawalId>,
    Json(body): Json<WithdrawalNotesBody>,
) -> ApiResult<WithdrawalRequest> {
    if body.admin_note.is_none() && body.tx_ref.is_none() {
        return Err(ApiError::bad_request("Nothing to update: provide adminNote or txRef"));
    }
    let request = platform.annotate_withdrawal(id, body.admin_note.as_deref(), body.tx_ref.as_deref())?;
    Ok(Json(request))
}
