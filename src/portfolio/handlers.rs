use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::TradeRequest;
use super::{repo, services};
use crate::{
    auth::{AuthUser, MessageResponse},
    error::{AppError, AppJson, AppResult},
    state::AppState,
};

pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio", get(get_portfolio))
        .route("/api/portfolio/buy", post(buy_stock))
        .route("/api/portfolio/sell", post(sell_stock))
        .route("/api/portfolio/history", get(get_transaction_history))
        .route("/api/portfolio/clear", delete(clear_portfolios))
}

fn trade_args(req: &TradeRequest) -> AppResult<(&str, i64)> {
    match (req.symbol.trim(), req.quantity) {
        ("", _) | (_, None) => Err(AppError::bad_request("symbol and quantity are required")),
        (symbol, Some(quantity)) => Ok((symbol, quantity)),
    }
}

#[instrument(skip(state))]
pub async fn get_portfolio(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Value>> {
    let portfolio = services::portfolio(&state, user_id).await?;
    Ok(Json(json!({ "status": "success", "portfolio": portfolio })))
}

#[instrument(skip(state))]
pub async fn buy_stock(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(req): AppJson<TradeRequest>,
) -> AppResult<Json<Value>> {
    let (symbol, quantity) = trade_args(&req)?;
    let transaction = services::buy(&state, user_id, symbol, quantity).await?;
    Ok(Json(json!({ "status": "success", "transaction": transaction })))
}

#[instrument(skip(state))]
pub async fn sell_stock(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(req): AppJson<TradeRequest>,
) -> AppResult<Json<Value>> {
    let (symbol, quantity) = trade_args(&req)?;
    let transaction = services::sell(&state, user_id, symbol, quantity).await?;
    Ok(Json(json!({ "status": "success", "transaction": transaction })))
}

#[instrument(skip(state))]
pub async fn get_transaction_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Value>> {
    let history = services::history(&state, user_id).await?;
    Ok(Json(json!({ "status": "success", "history": history })))
}

#[instrument(skip(state))]
pub async fn clear_portfolios(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    repo::clear_all(&state.db).await?;
    info!("all portfolios cleared");
    Ok(Json(MessageResponse::success("All portfolios cleared")))
}
