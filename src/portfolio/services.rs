use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{HistoryEntry, HoldingView, PortfolioView, TradeReceipt, TradeSide};
use super::repo;
use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::stocks::services::normalize_symbol;

/// Decimal places kept for the average cost basis.
pub const AVERAGE_PRICE_DP: u32 = 6;

pub fn validate_quantity(quantity: i64) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::bad_request("Quantity must be positive"));
    }
    Ok(())
}

fn too_large() -> AppError {
    AppError::bad_request("Quantity too large")
}

/// `quantity × price`, rejecting amounts that do not fit a `Decimal`.
pub fn trade_total(quantity: i64, price: Decimal) -> AppResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(price)
        .ok_or_else(too_large)
}

/// Quantity and weighted average cost after buying `quantity` at `price`.
pub fn apply_buy(
    held: i64,
    average_price: Decimal,
    quantity: i64,
    price: Decimal,
) -> AppResult<(i64, Decimal)> {
    let new_quantity = held.checked_add(quantity).ok_or_else(too_large)?;
    let cost = trade_total(held, average_price)?
        .checked_add(trade_total(quantity, price)?)
        .ok_or_else(too_large)?;
    let new_average = cost
        .checked_div(Decimal::from(new_quantity))
        .ok_or_else(too_large)?
        .round_dp(AVERAGE_PRICE_DP);
    Ok((new_quantity, new_average))
}

/// Remaining quantity after selling; the cost basis is untouched by sells.
pub fn apply_sell(held: i64, quantity: i64) -> AppResult<i64> {
    if held < quantity {
        return Err(AppError::bad_request("Insufficient shares for sale"));
    }
    Ok(held - quantity)
}

async fn require_user(state: &AppState, user_id: Uuid) -> AppResult<()> {
    User::find_by_id(&state.db, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn buy(
    state: &AppState,
    user_id: Uuid,
    symbol: &str,
    quantity: i64,
) -> AppResult<TradeReceipt> {
    validate_quantity(quantity)?;
    let symbol = normalize_symbol(symbol)?;
    require_user(state, user_id).await?;

    let price = state.quotes.latest_price(&symbol).await?.bar.close;
    let total_cost = trade_total(quantity, price)?;

    let mut tx = state.db.begin().await?;
    repo::ensure_holding_tx(&mut tx, user_id, &symbol, price).await?;
    let (held, average) = repo::lock_holding_tx(&mut tx, user_id, &symbol)
        .await?
        .unwrap_or((0, price));
    let (new_quantity, new_average) = apply_buy(held, average, quantity, price)?;
    repo::update_holding_tx(&mut tx, user_id, &symbol, new_quantity, new_average).await?;
    let (transaction_id, timestamp) =
        repo::insert_transaction_tx(&mut tx, user_id, &symbol, quantity, price, TradeSide::Buy)
            .await?;
    tx.commit().await?;

    info!(%user_id, %symbol, quantity, %price, new_quantity, %new_average, "stock bought");
    Ok(TradeReceipt {
        transaction_id,
        symbol,
        side: TradeSide::Buy,
        quantity,
        price,
        total_cost: Some(total_cost),
        total_proceeds: None,
        holding_quantity: new_quantity,
        timestamp,
    })
}

pub async fn sell(
    state: &AppState,
    user_id: Uuid,
    symbol: &str,
    quantity: i64,
) -> AppResult<TradeReceipt> {
    validate_quantity(quantity)?;
    let symbol = normalize_symbol(symbol)?;
    require_user(state, user_id).await?;

    // Rechecked under the row lock below.
    let held = repo::held_quantity(&state.db, user_id, &symbol).await?;
    if let Err(e) = apply_sell(held, quantity) {
        warn!(%user_id, %symbol, held, quantity, "insufficient shares");
        return Err(e);
    }

    let price = state.quotes.latest_price(&symbol).await?.bar.close;
    let total_proceeds = trade_total(quantity, price)?;

    let mut tx = state.db.begin().await?;
    let (held, average) = repo::lock_holding_tx(&mut tx, user_id, &symbol)
        .await?
        .unwrap_or((0, price));
    let remaining = apply_sell(held, quantity)?;
    if remaining == 0 {
        repo::delete_holding_tx(&mut tx, user_id, &symbol).await?;
    } else {
        repo::update_holding_tx(&mut tx, user_id, &symbol, remaining, average).await?;
    }
    let (transaction_id, timestamp) =
        repo::insert_transaction_tx(&mut tx, user_id, &symbol, quantity, price, TradeSide::Sell)
            .await?;
    tx.commit().await?;

    info!(%user_id, %symbol, quantity, %price, remaining, "stock sold");
    Ok(TradeReceipt {
        transaction_id,
        symbol,
        side: TradeSide::Sell,
        quantity,
        price,
        total_cost: None,
        total_proceeds: Some(total_proceeds),
        holding_quantity: remaining,
        timestamp,
    })
}

/// Holdings valued at the latest close.
pub async fn portfolio(state: &AppState, user_id: Uuid) -> AppResult<PortfolioView> {
    require_user(state, user_id).await?;
    let holdings = repo::list_holdings(&state.db, user_id).await?;

    let mut view = PortfolioView {
        holdings: Vec::with_capacity(holdings.len()),
        total_value: Decimal::ZERO,
    };
    for h in holdings {
        let current_price = state.quotes.latest_price(&h.symbol).await?.bar.close;
        let qty = Decimal::from(h.quantity);
        let total_value = qty.saturating_mul(current_price);
        view.total_value = view.total_value.saturating_add(total_value);
        view.holdings.push(HoldingView {
            gain_loss: total_value.saturating_sub(qty.saturating_mul(h.average_price)),
            symbol: h.symbol,
            quantity: h.quantity,
            average_price: h.average_price,
            current_price,
            total_value,
        });
    }
    Ok(view)
}

pub async fn history(state: &AppState, user_id: Uuid) -> AppResult<Vec<HistoryEntry>> {
    require_user(state, user_id).await?;
    let rows = repo::list_transactions(&state.db, user_id).await?;
    Ok(rows.into_iter().map(HistoryEntry::from).collect())
}
