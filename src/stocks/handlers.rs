use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::dto::{HistoryQuery, OutputSize, ValidateResponse};
use super::services::{normalize_symbol, stock_info};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock/validate/:symbol", get(validate_symbol))
        .route("/api/stock/price/:symbol", get(get_stock_price))
        .route("/api/stock/history/:symbol", get(get_stock_history))
        .route("/api/stock/company/:symbol", get(get_company_info))
        .route("/api/stock/:symbol", get(get_stock_info))
}

#[instrument(skip(state))]
pub async fn validate_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<ValidateResponse>> {
    let valid = match normalize_symbol(&symbol) {
        Ok(s) => state.quotes.validate(&s).await,
        Err(_) => false,
    };
    Ok(Json(ValidateResponse {
        status: "success",
        symbol: symbol.trim().to_uppercase(),
        valid,
    }))
}

#[instrument(skip(state))]
pub async fn get_stock_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<Value>> {
    let symbol = normalize_symbol(&symbol)?;
    let price_info = state.quotes.latest_price(&symbol).await?;
    Ok(Json(json!({ "status": "success", "price_info": price_info })))
}

#[instrument(skip(state))]
pub async fn get_stock_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<Value>> {
    let size = match q.outputsize.as_deref() {
        None => OutputSize::default(),
        Some(raw) => raw.parse::<OutputSize>().map_err(AppError::BadRequest)?,
    };
    let symbol = normalize_symbol(&symbol)?;
    let history = state.quotes.daily_history(&symbol, size).await?;
    Ok(Json(json!({ "status": "success", "history": history })))
}

#[instrument(skip(state))]
pub async fn get_company_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<Value>> {
    let symbol = normalize_symbol(&symbol)?;
    let company_info = state.quotes.company_overview(&symbol).await?;
    Ok(Json(json!({ "status": "success", "company_info": company_info })))
}

#[instrument(skip(state))]
pub async fn get_stock_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<Value>> {
    let symbol = normalize_symbol(&symbol)?;
    let info = stock_info(state.quotes.as_ref(), &symbol).await?;
    Ok(Json(json!({ "status": "success", "stock_info": info })))
}
