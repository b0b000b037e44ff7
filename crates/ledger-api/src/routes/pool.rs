//! Lending Pool API Routes
//!
//! - GET /pool - Aggregates, utilization, rate, and current price
//! - GET /pool/accounts/:account - One participant's position
//! - GET /pool/liquidatable - Accounts eligible for liquidation
//! - GET /pool/events?since=N - Event feed after sequence N
//! - POST /pool/deposit - Add liquidity
//! - POST /pool/withdraw - Withdraw principal and redeem shares
//! - POST /pool/collateral/deposit - Post collateral
//! - POST /pool/collateral/withdraw - Release collateral
//! - POST /pool/borrow - Borrow the stable asset
//! - POST /pool/repay - Repay stable debt

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::AccountId;
use lending::{EventRecord, LendingPool, PoolEvent};

use crate::dto::{
    ledger_failure, AccountResponse, AmountRequest, ApiError, ApiFailure, EventsQuery,
    LiquidatableResponse, OperationResponse, PoolResponse, WithdrawRequest,
};
use crate::AppState;

// =============================================================================
// Router
// =============================================================================

/// Create pool router
pub fn router() -> Router<AppState> {
    Router::new()
        // Reads
        .route("/", get(get_pool))
        .route("/accounts/:account", get(get_account))
        .route("/liquidatable", get(get_liquidatable))
        .route("/events", get(get_events))
        // Operations
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/collateral/deposit", post(post_collateral))
        .route("/collateral/withdraw", post(withdraw_collateral))
        .route("/borrow", post(borrow))
        .route("/repay", post(repay))
}

// =============================================================================
// Read handlers
// =============================================================================

/// GET /pool - Pool aggregates and market figures
async fn get_pool(State(state): State<AppState>) -> Result<Json<PoolResponse>, ApiFailure> {
    let pool = state.pool().await;
    let totals = *pool.totals();
    let quote = pool.quote().map_err(ledger_failure)?;

    Ok(Json(PoolResponse {
        total_liquidity: totals.total_liquidity,
        total_collateral: totals.total_collateral,
        total_debt_principal: totals.total_debt_principal,
        total_interest_collected: totals.total_interest_collected,
        total_shares: pool.total_shares(),
        utilization_bps: pool.utilization_bps().map_err(ledger_failure)?,
        borrow_rate_bps: pool.borrow_rate_bps().map_err(ledger_failure)?,
        price: quote.price,
        price_decimals: quote.decimals,
        collateralization_ratio: pool.params().collateralization_ratio(),
        liquidation_threshold: pool.params().liquidation_threshold(),
        accounts: pool.state().account_count(),
    }))
}

/// GET /pool/accounts/:account - Position of one participant
async fn get_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<AccountResponse>, ApiFailure> {
    let id = AccountId::parse(&account).map_err(ledger_failure)?;
    let pool = state.pool().await;
    let record = pool.account(&id);
    let share_balance = pool.share_balance_of(&id);

    Ok(Json(AccountResponse {
        account: id,
        deposit_principal: record.deposit_principal,
        share_balance,
        share_value: pool.preview_redeem(share_balance).map_err(ledger_failure)?,
        collateral: record.collateral_posted,
        debt_principal: record.debt_principal,
        debt_with_interest: pool.debt_with_interest_of(&id).map_err(ledger_failure)?,
        available_collateral: pool.available_collateral_of(&id).map_err(ledger_failure)?,
        max_borrow: pool.max_borrow_of(&id).map_err(ledger_failure)?,
        health: pool.position_health(&id).map_err(ledger_failure)?,
    }))
}

/// GET /pool/liquidatable - Accounts below the liquidation threshold
async fn get_liquidatable(
    State(state): State<AppState>,
) -> Result<Json<LiquidatableResponse>, ApiFailure> {
    let pool = state.pool().await;
    let accounts = pool.liquidatable_accounts().map_err(ledger_failure)?;
    Ok(Json(LiquidatableResponse { accounts }))
}

/// GET /pool/events?since=N - Events with a sequence above N
async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    let pool = state.pool().await;
    Json(pool.events_since(query.since).to_vec())
}

// =============================================================================
// Operation handlers
// =============================================================================

/// Run one operation under the exclusive lock and report its event
async fn apply<F>(state: &AppState, operation: F) -> Result<Json<OperationResponse>, ApiFailure>
where
    F: FnOnce(&mut LendingPool) -> ledger_core::Result<PoolEvent>,
{
    let mut pool = state.pool_mut().await;
    let event = operation(&mut *pool).map_err(ledger_failure)?;
    let sequence = pool.events().last().map(|r| r.sequence).ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal("event log empty after commit")),
        )
    })?;
    Ok(Json(OperationResponse { sequence, event }))
}

/// POST /pool/deposit
async fn deposit(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.deposit(&req.account, req.amount)).await
}

/// POST /pool/withdraw
async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.withdraw(&req.account, req.amount, req.shares)).await
}

/// POST /pool/collateral/deposit
async fn post_collateral(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.post_collateral(&req.account, req.amount)).await
}

/// POST /pool/collateral/withdraw
async fn withdraw_collateral(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.withdraw_collateral(&req.account, req.amount)).await
}

/// POST /pool/borrow
async fn borrow(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.borrow(&req.account, req.amount)).await
}

/// POST /pool/repay
async fn repay(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiFailure> {
    apply(&state, |pool| pool.repay(&req.account, req.amount)).await
}
