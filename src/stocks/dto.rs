use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBar {
    pub date: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// Latest bar for a symbol; `close` is the trade price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInfo {
    pub symbol: String,
    #[serde(flatten)]
    pub bar: DailyBar,
}

/// Daily bars, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub data: Vec<DailyBar>,
}

pub type CompanyOverview = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize)]
pub struct StockInfo {
    pub current_price: PriceInfo,
    pub company_info: CompanyOverview,
    pub historical_data: PriceHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputSize {
    #[default]
    Compact,
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            _ => Err("outputsize must be either compact or full".into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub outputsize: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub status: &'static str,
    pub symbol: String,
    pub valid: bool,
}
