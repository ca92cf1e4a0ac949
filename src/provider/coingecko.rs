//! CoinGecko-backed provider.
//!
//! Symbols are resolved to CoinGecko ids via `/search`, then priced via
//! `/simple/price` and described via `/coins/{id}`.

use super::{CoinMetadata, MarketDataProvider, PriceQuote};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use derive_builder::Builder;
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_VS_CURRENCY: &str = "usd";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest description kept, in characters.
const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct CoinGeckoConfig {
    /// API root, e.g. `https://api.coingecko.com/api/v3`
    #[builder(setter(into), default = "String::from(DEFAULT_BASE_URL)")]
    pub base_url: String,
    /// Fiat currency prices are quoted in
    #[builder(setter(into), default = "String::from(DEFAULT_VS_CURRENCY)")]
    pub vs_currency: String,
    /// Per-request timeout
    #[builder(default = "DEFAULT_TIMEOUT")]
    pub timeout: Duration,
}

impl CoinGeckoConfig {
    pub fn builder() -> CoinGeckoConfigBuilder {
        CoinGeckoConfigBuilder::default()
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    vs_currency: String,
    /// Uppercase symbol → CoinGecko id. Only successful lookups are kept.
    ids: Mutex<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    #[serde(default)]
    description: HashMap<String, Option<String>>,
}

impl CoinGeckoProvider {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("invalid CoinGecko URL: {base_url}"))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("coingecko: failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            vs_currency: config.vs_currency.to_ascii_lowercase(),
            ids: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).with_context(|| format!("coingecko: bad endpoint {raw}"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .context("coingecko: request failed")?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("coingecko: rate limited"));
        }

        let body = resp
            .error_for_status()
            .context("coingecko: non-success status")?
            .bytes()
            .await
            .context("coingecko: read body failed")?;

        serde_json::from_slice(&body).context("coingecko: parse JSON failed")
    }

    /// Resolve a ticker to a CoinGecko id, reusing earlier successes.
    async fn coin_id(&self, symbol: &str) -> Result<Option<String>> {
        let key = symbol.to_ascii_uppercase();
        if let Some(id) = self.ids.lock().await.get(&key) {
            return Ok(Some(id.clone()));
        }

        let mut url = self.endpoint("search")?;
        url.query_pairs_mut().append_pair("query", symbol);
        let found: SearchResponse = self.get_json(url).await?;

        let id = found
            .coins
            .into_iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(&key))
            .map(|c| c.id);

        if let Some(id) = &id {
            debug!(symbol = %key, id = %id, "coingecko: resolved id");
            self.ids.lock().await.insert(key, id.clone());
        }
        Ok(id)
    }

    async fn try_fetch_price(&self, symbol: &str) -> Result<Option<PriceQuote>> {
        let Some(id) = self.coin_id(symbol).await? else {
            debug!("coingecko: no id for {symbol}");
            return Ok(None);
        };

        let mut url = self.endpoint("simple/price")?;
        url.query_pairs_mut()
            .append_pair("ids", &id)
            .append_pair("vs_currencies", &self.vs_currency);

        // Parse like: { "bitcoin": {"usd": 12345.6} }
        let parsed: HashMap<String, HashMap<String, Option<f64>>> = self.get_json(url).await?;

        let price = parsed
            .get(&id)
            .and_then(|rec| rec.get(&self.vs_currency).copied().flatten());

        Ok(price.map(|price| PriceQuote {
            symbol: symbol.to_ascii_uppercase(),
            price,
            timestamp: Utc::now(),
        }))
    }

    async fn try_fetch_metadata(&self, symbol: &str) -> Result<Option<CoinMetadata>> {
        let Some(id) = self.coin_id(symbol).await? else {
            debug!("coingecko: no id for {symbol}");
            return Ok(None);
        };

        let mut url = self.endpoint(&format!("coins/{id}"))?;
        url.query_pairs_mut()
            .append_pair("localization", "false")
            .append_pair("tickers", "false")
            .append_pair("market_data", "false")
            .append_pair("community_data", "false")
            .append_pair("developer_data", "false")
            .append_pair("sparkline", "false");

        let coin: CoinResponse = self.get_json(url).await?;
        let raw = coin
            .description
            .get("en")
            .cloned()
            .flatten()
            .unwrap_or_default();

        let metadata = CoinMetadata {
            description: Some(clean_description(&raw)).filter(|d| !d.is_empty()),
            // CoinGecko has no structured founder list
            founders: Vec::new(),
        };

        Ok((!metadata.is_empty()).then_some(metadata))
    }
}

static HTML_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Strip HTML tags, keep the first paragraph and cap the length.
fn clean_description(raw: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(raw, "");
    let first = text.split('\n').next().unwrap_or_default().trim();

    if first.chars().count() > MAX_DESCRIPTION_CHARS {
        let cut: String = first.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_price(&self, symbol: &str) -> Option<PriceQuote> {
        match self.try_fetch_price(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Failed to fetch price for {symbol}: {e:#}");
                None
            }
        }
    }

    async fn fetch_metadata(&self, symbol: &str) -> Option<CoinMetadata> {
        match self.try_fetch_metadata(symbol).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Failed to fetch metadata for {symbol}: {e:#}");
                None
            }
        }
    }
}
