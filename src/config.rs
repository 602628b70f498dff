use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub market_data: MarketDataConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "portfolio-arena".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "portfolio-arena-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let market_data = MarketDataConfig {
            api_key: std::env::var("ALPHA_VANTAGE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ALPHA_VANTAGE_URL.into()),
            cache_ttl_secs: env_or("QUOTE_CACHE_TTL_SECS", 15 * 60),
        };
        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            market_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        std::env::set_var("PORTFOLIO_ARENA_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("PORTFOLIO_ARENA_TEST_GARBAGE", 7u32), 7);
        assert_eq!(env_or("PORTFOLIO_ARENA_TEST_MISSING", 42i64), 42);
    }

    #[test]
    fn env_or_parses_present_value() {
        std::env::set_var("PORTFOLIO_ARENA_TEST_TTL", "120");
        assert_eq!(env_or("PORTFOLIO_ARENA_TEST_TTL", 900u64), 120);
    }
}
