mod alphavantage;
mod cache;
pub mod dto;
pub mod handlers;
pub mod services;
mod source;

use crate::state::AppState;
use axum::Router;

pub use alphavantage::AlphaVantageClient;
#[cfg(test)]
pub use source::FixedQuotes;
pub use source::QuoteSource;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::stock_routes())
}
