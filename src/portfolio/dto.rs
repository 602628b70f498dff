use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::TransactionRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    #[serde(default)]
    pub symbol: String,
    pub quantity: Option<i64>,
}

/// Result of a buy or sell.
#[derive(Debug, Serialize)]
pub struct TradeReceipt {
    pub transaction_id: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_proceeds: Option<Decimal>,
    /// Shares held after the trade.
    pub holding_quantity: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub total_value: Decimal,
    pub gain_loss: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PortfolioView {
    pub holdings: Vec<HoldingView>,
    pub total_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub transaction_id: i64,
    pub symbol: String,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub total: Decimal,
}

impl From<TransactionRow> for HistoryEntry {
    fn from(t: TransactionRow) -> Self {
        Self {
            transaction_id: t.id,
            total: t.price.saturating_mul(Decimal::from(t.quantity)),
            symbol: t.symbol,
            quantity: t.quantity,
            price: t.price,
            transaction_type: t.transaction_type,
            timestamp: t.created_at,
        }
    }
}
