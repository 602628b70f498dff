use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{OutputSize, StockInfo};
use super::source::QuoteSource;
use crate::error::{AppError, AppResult};

/// Upper-cases and validates a ticker such as `aapl` or `brk.b`.
pub fn normalize_symbol(raw: &str) -> AppResult<String> {
    lazy_static! {
        static ref SYMBOL_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").unwrap();
    }
    let symbol = raw.trim().to_uppercase();
    if !SYMBOL_RE.is_match(&symbol) {
        return Err(AppError::bad_request(format!("Invalid stock symbol: {raw}")));
    }
    Ok(symbol)
}

pub async fn stock_info(quotes: &dyn QuoteSource, symbol: &str) -> AppResult<StockInfo> {
    let current_price = quotes.latest_price(symbol).await?;
    let company_info = quotes.company_overview(symbol).await?;
    let historical_data = quotes.daily_history(symbol, OutputSize::Compact).await?;
    Ok(StockInfo {
        current_price,
        company_info,
        historical_data,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::stocks::source::FixedQuotes;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
    }

    #[test]
    fn rejects_garbage_symbols() {
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("AAPL;DROP").is_err());
        assert!(normalize_symbol("WAYTOOLONGSYMBOL").is_err());
    }

    #[tokio::test]
    async fn stock_info_combines_all_sources() {
        let quotes = FixedQuotes::with(&[("AAPL", Decimal::new(102, 0))]);
        let info = stock_info(&quotes, "AAPL").await.unwrap();
        assert_eq!(info.current_price.bar.close, Decimal::new(102, 0));
        assert_eq!(info.company_info["Symbol"], "AAPL");
        assert_eq!(info.historical_data.data.len(), 1);
    }

    #[tokio::test]
    async fn stock_info_unknown_symbol_is_not_found() {
        let quotes = FixedQuotes::default();
        let err = stock_info(&quotes, "ZZZZ").await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
