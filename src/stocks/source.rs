use async_trait::async_trait;
use thiserror::Error;

use super::dto::{CompanyOverview, OutputSize, PriceHistory, PriceInfo};
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Unknown stock symbol: {0}")]
    UnknownSymbol(String),

    #[error("Alpha Vantage API key not configured")]
    NotConfigured,

    #[error("{0}")]
    Transport(String),
}

impl From<QuoteError> for AppError {
    fn from(e: QuoteError) -> Self {
        match e {
            QuoteError::UnknownSymbol(_) => AppError::NotFound(e.to_string()),
            QuoteError::NotConfigured => AppError::Internal(anyhow::anyhow!(e)),
            QuoteError::Transport(msg) => AppError::Upstream(msg),
        }
    }
}

/// Market data used for valuation and trade pricing.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn daily_history(
        &self,
        symbol: &str,
        size: OutputSize,
    ) -> Result<PriceHistory, QuoteError>;

    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, QuoteError>;

    /// Most recent daily bar.
    async fn latest_price(&self, symbol: &str) -> Result<PriceInfo, QuoteError> {
        let history = self.daily_history(symbol, OutputSize::Compact).await?;
        history
            .data
            .into_iter()
            .next()
            .map(|bar| PriceInfo {
                symbol: history.symbol,
                bar,
            })
            .ok_or_else(|| QuoteError::UnknownSymbol(symbol.to_string()))
    }

    async fn validate(&self, symbol: &str) -> bool {
        self.latest_price(symbol).await.is_ok()
    }
}

#[cfg(test)]
pub use fixed::FixedQuotes;

#[cfg(test)]
mod fixed {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::{QuoteError, QuoteSource};
    use crate::stocks::dto::{CompanyOverview, DailyBar, OutputSize, PriceHistory};

    /// Quote source backed by a settable map of closing prices.
    #[derive(Default)]
    pub struct FixedQuotes {
        closes: RwLock<HashMap<String, Decimal>>,
    }

    impl FixedQuotes {
        pub fn with(prices: &[(&str, Decimal)]) -> Self {
            let quotes = Self::default();
            for (symbol, close) in prices {
                quotes.set(symbol, *close);
            }
            quotes
        }

        pub fn set(&self, symbol: &str, close: Decimal) {
            self.closes
                .write()
                .unwrap()
                .insert(symbol.to_string(), close);
        }
    }

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn daily_history(
            &self,
            symbol: &str,
            _size: OutputSize,
        ) -> Result<PriceHistory, QuoteError> {
            let close = self
                .closes
                .read()
                .unwrap()
                .get(symbol)
                .copied()
                .ok_or_else(|| QuoteError::UnknownSymbol(symbol.to_string()))?;
            Ok(PriceHistory {
                symbol: symbol.to_string(),
                data: vec![DailyBar {
                    date: "2024-12-10".into(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000_000,
                }],
            })
        }

        async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, QuoteError> {
            if !self.closes.read().unwrap().contains_key(symbol) {
                return Err(QuoteError::UnknownSymbol(symbol.to_string()));
            }
            let mut overview = CompanyOverview::new();
            overview.insert("Symbol".into(), symbol.into());
            overview.insert("Name".into(), format!("{symbol} Inc").into());
            Ok(overview)
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn latest_price_takes_newest_bar() {
        let quotes = FixedQuotes::with(&[("AAPL", Decimal::new(10200, 2))]);
        let info = quotes.latest_price("AAPL").await.unwrap();
        assert_eq!(info.symbol, "AAPL");
        assert_eq!(info.bar.close, Decimal::new(10200, 2));
    }

    #[tokio::test]
    async fn validate_reports_unknown_symbols() {
        let quotes = FixedQuotes::with(&[("AAPL", Decimal::ONE)]);
        assert!(quotes.validate("AAPL").await);
        assert!(!quotes.validate("INVALID").await);
    }

    #[test]
    fn quote_errors_map_to_statuses() {
        use axum::http::StatusCode;
        let unknown: AppError = QuoteError::UnknownSymbol("ZZZZ".into()).into();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        let transport: AppError = QuoteError::Transport("timed out".into()).into();
        assert_eq!(transport.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
