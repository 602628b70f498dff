use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::cache::TtlCache;
use super::dto::{CompanyOverview, DailyBar, OutputSize, PriceHistory};
use super::source::{QuoteError, QuoteSource};
use crate::config::MarketDataConfig;

/// Overview fields that Alpha Vantage returns as strings but are numeric.
const NUMERIC_OVERVIEW_FIELDS: &[&str] = &[
    "MarketCapitalization",
    "EBITDA",
    "PERatio",
    "PEGRatio",
    "BookValue",
    "DividendPerShare",
    "DividendYield",
    "EPS",
    "RevenuePerShareTTM",
    "ProfitMargin",
    "OperatingMarginTTM",
    "ReturnOnAssetsTTM",
    "ReturnOnEquityTTM",
    "RevenueTTM",
    "GrossProfitTTM",
    "DilutedEPSTTM",
    "QuarterlyEarningsGrowthYOY",
    "QuarterlyRevenueGrowthYOY",
    "AnalystTargetPrice",
    "TrailingPE",
    "ForwardPE",
    "PriceToSalesRatioTTM",
    "PriceToBookRatio",
    "EVToRevenue",
    "EVToEBITDA",
    "Beta",
    "52WeekHigh",
    "52WeekLow",
    "50DayMovingAverage",
    "200DayMovingAverage",
    "SharesOutstanding",
];

/// Alpha Vantage market data client.
///
/// - Prices come from `TIME_SERIES_DAILY`; the newest close is the trade price.
/// - Company data comes from `OVERVIEW`.
/// - Every response is cached for the configured TTL; the free tier only
///   allows a couple of dozen requests per day.
pub struct AlphaVantageClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    history: TtlCache<PriceHistory>,
    overview: TtlCache<CompanyOverview>,
}

impl AlphaVantageClient {
    pub fn new(cfg: &MarketDataConfig) -> Self {
        let ttl = Duration::from_secs(cfg.cache_ttl_secs);
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.clone(),
            history: TtlCache::new(ttl),
            overview: TtlCache::new(ttl),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::NotConfigured)?;
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", api_key)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport_error)?;
        resp.json::<Value>().await.map_err(transport_error)
    }
}

/// Strips the query string from reqwest errors so the API key never lands in logs.
fn transport_error(e: reqwest::Error) -> QuoteError {
    let msg = e.to_string();
    let sanitized = match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg,
    };
    QuoteError::Transport(sanitized)
}

#[derive(Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Rate-limit and key problems come back as 200 with a `Note` or `Information` body.
fn throttle_message(body: &Value) -> Option<String> {
    ["Note", "Information"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

pub(crate) fn parse_daily_series(symbol: &str, body: Value) -> Result<PriceHistory, QuoteError> {
    if let Some(note) = throttle_message(&body) {
        warn!(%symbol, %note, "alpha vantage refused request");
        return Err(QuoteError::Transport(note));
    }
    let series = body
        .get("Time Series (Daily)")
        .cloned()
        .ok_or_else(|| {
            error!(%symbol, response = %body, "invalid daily series response");
            QuoteError::UnknownSymbol(symbol.to_string())
        })?;
    let raw: BTreeMap<String, RawBar> = serde_json::from_value(series)
        .map_err(|e| QuoteError::Transport(format!("unexpected daily series for {symbol}: {e}")))?;

    let mut data = raw
        .into_iter()
        .map(|(date, bar)| to_bar(symbol, date, bar))
        .collect::<Result<Vec<_>, _>>()?;
    data.reverse();

    Ok(PriceHistory {
        symbol: symbol.to_string(),
        data,
    })
}

fn to_bar(symbol: &str, date: String, raw: RawBar) -> Result<DailyBar, QuoteError> {
    let num = |field: &str, v: &str| {
        Decimal::from_str(v.trim()).map_err(|e| {
            QuoteError::Transport(format!("bad {field} '{v}' for {symbol} on {date}: {e}"))
        })
    };
    Ok(DailyBar {
        open: num("open", &raw.open)?,
        high: num("high", &raw.high)?,
        low: num("low", &raw.low)?,
        close: num("close", &raw.close)?,
        volume: raw.volume.trim().parse().map_err(|e| {
            QuoteError::Transport(format!("bad volume '{}' for {symbol}: {e}", raw.volume))
        })?,
        date,
    })
}

pub(crate) fn parse_overview(symbol: &str, body: Value) -> Result<CompanyOverview, QuoteError> {
    if let Some(note) = throttle_message(&body) {
        warn!(%symbol, %note, "alpha vantage refused request");
        return Err(QuoteError::Transport(note));
    }
    let mut overview = match body {
        Value::Object(map) if map.contains_key("Symbol") => map,
        other => {
            error!(%symbol, response = %other, "invalid overview response");
            return Err(QuoteError::UnknownSymbol(symbol.to_string()));
        }
    };

    for field in NUMERIC_OVERVIEW_FIELDS {
        let Some(Value::String(raw)) = overview.get(*field) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            Some(n) => {
                overview.insert((*field).to_string(), Value::Number(n));
            }
            None => debug!(%symbol, field, value = %raw, "overview field left as string"),
        }
    }
    Ok(overview)
}

#[async_trait]
impl QuoteSource for AlphaVantageClient {
    async fn daily_history(
        &self,
        symbol: &str,
        size: OutputSize,
    ) -> Result<PriceHistory, QuoteError> {
        let key = format!("historical_{}_{}", symbol, size.as_str());
        if let Some(hit) = self.history.get(&key).await {
            return Ok(hit);
        }
        let body = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", size.as_str()),
            ])
            .await?;
        let history = parse_daily_series(symbol, body)?;
        self.history.insert(key, history.clone()).await;
        Ok(history)
    }

    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, QuoteError> {
        let key = format!("info_{symbol}");
        if let Some(hit) = self.overview.get(&key).await {
            return Ok(hit);
        }
        let body = self
            .query(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;
        let overview = parse_overview(symbol, body)?;
        self.overview.insert(key, overview.clone()).await;
        Ok(overview)
    }
}
