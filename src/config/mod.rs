use crate::args::{AgentArgs, ServeArgs, DEFAULT_KB_PATH};
use crate::context::DEFAULT_HISTORY_LIMIT;
use crate::provider::{
    CoinGeckoConfig, CoinGeckoProvider, MarketDataProvider, MockProvider, ProviderKind,
};
use anyhow::{Context, Result};
use derive_builder::Builder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct ProviderConfig {
    /// Which provider to talk to
    #[builder(default)]
    pub kind: ProviderKind,
    /// CoinGecko endpoint settings (ignored by the mock)
    #[builder(default)]
    pub coingecko: CoinGeckoConfig,
    /// Add noise to mock prices
    #[builder(default = "false")]
    pub mock_jitter: bool,
}

impl ProviderConfig {
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }

    pub fn build_provider(&self) -> Result<Box<dyn MarketDataProvider>> {
        let provider: Box<dyn MarketDataProvider> = match self.kind {
            ProviderKind::CoinGecko => Box::new(
                CoinGeckoProvider::new(self.coingecko.clone())
                    .context("Failed to set up CoinGecko provider")?,
            ),
            ProviderKind::Mock if self.mock_jitter => Box::new(MockProvider::new().with_jitter()),
            ProviderKind::Mock => Box::new(MockProvider::new()),
        };
        Ok(provider)
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct AgentConfig {
    /// Knowledge base file
    #[builder(setter(into), default = "PathBuf::from(DEFAULT_KB_PATH)")]
    pub kb_path: PathBuf,
    /// Conversation turns kept for context
    #[builder(default = "DEFAULT_HISTORY_LIMIT")]
    pub history_limit: usize,
    /// Cached prices younger than this are served without a remote call
    #[builder(setter(strip_option), default)]
    pub price_freshness: Option<Duration>,
    #[builder(default)]
    pub provider: ProviderConfig,
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    pub(crate) fn setup(args: &AgentArgs) -> Result<Self> {
        let mut coingecko = CoinGeckoConfig::builder()
            .vs_currency(args.vs_currency.trim())
            .timeout(Duration::from_secs(args.timeout_secs));
        if let Some(url) = &args.coingecko_url {
            coingecko = coingecko.base_url(url.trim());
        }

        let provider = ProviderConfig::builder()
            .kind(args.provider)
            .coingecko(coingecko.build().context("Invalid CoinGecko configuration")?)
            .mock_jitter(args.mock_jitter)
            .build()
            .context("Invalid provider configuration")?;

        let mut builder = AgentConfig::builder()
            .kb_path(args.kb_path.clone())
            .history_limit(args.history_limit)
            .provider(provider);
        if let Some(secs) = args.price_freshness_secs {
            builder = builder.price_freshness(Duration::from_secs(secs));
        }

        builder.build().context("Invalid agent configuration")
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            coingecko: CoinGeckoConfig::default(),
            mock_jitter: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind_addr: SocketAddr,
}

impl ServeConfig {
    pub(crate) fn setup(args: &ServeArgs) -> Self {
        Self {
            bind_addr: args.bind,
        }
    }
}
