//! Remote price / metadata providers.
//!
//! Providers never fail loudly: transport errors, bad statuses and missing
//! fields are logged and reported as `None`, which callers treat exactly like
//! "the provider has no data".

pub mod coingecko;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

pub use coingecko::{CoinGeckoConfig, CoinGeckoProvider};
pub use mock::MockProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinMetadata {
    pub description: Option<String>,
    #[serde(default)]
    pub founders: Vec<String>,
}

impl CoinMetadata {
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn has_founders(&self) -> bool {
        self.founders.iter().any(|f| !f.trim().is_empty())
    }

    /// Neither a description nor founders: nothing worth reporting.
    pub fn is_empty(&self) -> bool {
        self.description().is_none() && !self.has_founders()
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Current price of `symbol` in the provider's quote currency.
    async fn fetch_price(&self, symbol: &str) -> Option<PriceQuote>;

    /// Description and founders of `symbol`.
    async fn fetch_metadata(&self, symbol: &str) -> Option<CoinMetadata>;
}

/// Which provider backs the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// CoinGecko public API
    #[default]
    CoinGecko,
    /// Offline reference prices, no metadata
    Mock,
}

pub fn parse_provider_kind(s: &str) -> Result<ProviderKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "coingecko" | "gecko" | "live" => Ok(ProviderKind::CoinGecko),
        "mock" | "offline" => Ok(ProviderKind::Mock),
        other => Err(format!(
            "invalid CRYPTO_PROVIDER '{}'; expected one of: coingecko, mock",
            other
        )),
    }
}
