//! The query pipeline.
//!
//! resolve entity → classify intent → arbitrate between the knowledge store
//! and the remote provider → attribute → remember the turn.
//!
//! One [`CryptoAgent`] owns its store, provider and conversation. It handles
//! one request at a time (`&mut self`); share it behind a mutex if needed.

mod media;
mod reply;

pub use media::MediaHints;
pub use reply::{
    format_usd, MissingData, Reply, Source, CLARIFICATION, INSUFFICIENT_METADATA,
    INSUFFICIENT_PRICE, POLICY_REFUSAL,
};

use crate::config::AgentConfig;
use crate::context::{ContextTracker, Role, Vocabulary};
use crate::intent::Intent;
use crate::knowledge::{CoinRecord, KnowledgeStore, MetadataPatch};
use crate::provider::{CoinMetadata, MarketDataProvider};
use crate::resolver::resolve_query;
use anyhow::Result;
use chrono::{TimeDelta, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CryptoAgent {
    store: KnowledgeStore,
    provider: Box<dyn MarketDataProvider>,
    context: ContextTracker,
    /// Cached prices younger than this skip the provider. `None`: always revalidate.
    price_freshness: Option<TimeDelta>,
}

impl CryptoAgent {
    /// Build an agent around an already-loaded store.
    ///
    /// The resolver's vocabulary is the built-in one plus every coin the
    /// store knows about, by symbol and by name.
    pub fn new(
        store: KnowledgeStore,
        provider: Box<dyn MarketDataProvider>,
        history_limit: usize,
    ) -> Self {
        let mut vocabulary = Vocabulary::builtin();
        for symbol in store.symbols() {
            vocabulary.add_symbol(symbol);
        }
        for (name, symbol) in store.name_index() {
            vocabulary.add_name(&name, &symbol);
        }

        Self {
            store,
            provider,
            context: ContextTracker::new(history_limit, vocabulary),
            price_freshness: None,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let store = KnowledgeStore::open(&config.kb_path)?;
        let provider = config.provider.build_provider()?;
        let mut agent = Self::new(store, provider, config.history_limit);
        if let Some(window) = config.price_freshness {
            agent = agent.with_price_freshness(window);
        }
        Ok(agent)
    }

    /// Windows beyond what a [`TimeDelta`] can hold are clamped to its maximum.
    pub fn with_price_freshness(mut self, window: Duration) -> Self {
        let delta = TimeDelta::from_std(window).unwrap_or_else(|_| {
            warn!(?window, "price freshness window out of range; clamping");
            TimeDelta::MAX
        });
        self.price_freshness = Some(delta);
        self
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn context(&self) -> &ContextTracker {
        &self.context
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run the whole pipeline for one user utterance.
    ///
    /// Refusals, clarifications and "insufficient data" are replies, not
    /// errors. `Err` means the knowledge base could not be persisted.
    pub async fn handle(&mut self, text: &str) -> Result<Reply> {
        let query = resolve_query(&mut self.context, text);
        debug!(
            intent = %query.intent,
            symbol = ?query.symbol,
            via = ?query.resolved_by,
            "resolved query"
        );

        let reply = match (query.intent, query.symbol.as_deref()) {
            (Intent::Unknown, _) => Reply::PolicyRefusal,
            (_, None) => Reply::Clarification,
            (Intent::Price, Some(symbol)) => self.answer_price(symbol).await?,
            (Intent::Metadata, Some(symbol)) => self.answer_metadata(symbol).await?,
        };

        if reply.is_answer() {
            self.context.record_turn(Role::User, text);
            self.context.record_turn(Role::Assistant, reply.to_string());
        }

        Ok(reply)
    }

    /// [`Self::handle`], rendered as the text shown to the user.
    pub async fn process_query(&mut self, text: &str) -> Result<String> {
        Ok(self.handle(text).await?.to_string())
    }

    /// Media hints for the coin in `query`, else the last discussed coin,
    /// else the store's `DEFAULT` entry.
    pub fn media_hints(&mut self, query: &str) -> MediaHints {
        let symbol = self
            .context
            .resolve_entity(query)
            .or_else(|| self.context.last_entity().map(str::to_string));
        media::hints_for(&self.store, symbol.as_deref())
    }

    /// Icon of the last discussed coin, empty when unknown.
    pub fn icon_for_last_entity(&self) -> String {
        self.context
            .last_entity()
            .and_then(|s| self.store.get(s))
            .and_then(CoinRecord::icon_url)
            .unwrap_or_default()
            .to_string()
    }

    /// Price is time-sensitive: ask the provider first, fall back to the cache.
    async fn answer_price(&mut self, symbol: &str) -> Result<Reply> {
        if let Some(price) = self.fresh_cached_price(symbol) {
            debug!(%symbol, "cached price within freshness window");
            return Ok(price_answer(symbol, price, Source::KnowledgeBase));
        }

        if let Some(quote) = self.provider.fetch_price(symbol).await {
            self.store
                .update_price(symbol, quote.price, quote.timestamp)?;
            info!(%symbol, price = quote.price, "price written through to knowledge base");

            if let Some(price) = self.cached_price(symbol) {
                return Ok(price_answer(symbol, price, Source::RemoteProvider));
            }
        }

        match self.cached_price(symbol) {
            Some(price) => {
                debug!(%symbol, "provider had no price; serving cached one");
                Ok(price_answer(symbol, price, Source::KnowledgeBase))
            }
            None => Ok(Reply::InsufficientData(MissingData::Price)),
        }
    }

    /// Metadata lives in the store; the provider fills gaps.
    async fn answer_metadata(&mut self, symbol: &str) -> Result<Reply> {
        let mut source = Source::KnowledgeBase;
        // one provider round-trip per request at most
        let mut fetched: Option<Option<CoinMetadata>> = None;

        if self.store.get(symbol).is_none() {
            let Some(meta) = self.provider.fetch_metadata(symbol).await else {
                return Ok(Reply::InsufficientData(MissingData::Metadata));
            };
            self.store.merge_metadata(
                symbol,
                &MetadataPatch {
                    description: meta.description().map(str::to_string),
                    founders: Some(meta.founders.clone()),
                    ..MetadataPatch::default()
                },
            )?;
            info!(%symbol, "metadata for unknown coin written to knowledge base");
            source = Source::RemoteProviderMetadata;
            fetched = Some(Some(meta));
        }

        let (needs_description, needs_founders) = match self.store.get(symbol) {
            Some(rec) => (rec.description().is_none(), !rec.has_founders()),
            None => return Ok(Reply::InsufficientData(MissingData::Metadata)),
        };

        if needs_description || needs_founders {
            let meta = match fetched {
                Some(meta) => meta,
                None => self.provider.fetch_metadata(symbol).await,
            };
            if let Some(meta) = meta {
                if self.backfill(symbol, &meta, needs_description, needs_founders)? {
                    source = Source::RemoteProviderMetadata;
                }
            }
        }

        match self.store.get(symbol) {
            Some(rec) => Ok(Reply::Answer {
                text: describe(symbol, rec),
                source,
            }),
            None => Ok(Reply::InsufficientData(MissingData::Metadata)),
        }
    }

    /// Fill the missing fields only. Returns whether anything was written.
    fn backfill(
        &mut self,
        symbol: &str,
        meta: &CoinMetadata,
        description: bool,
        founders: bool,
    ) -> Result<bool> {
        let mut written = false;

        if description {
            if let Some(text) = meta.description() {
                written |= self
                    .store
                    .merge_metadata(symbol, &MetadataPatch::description(text))?;
            }
        }
        if founders && meta.has_founders() {
            written |= self
                .store
                .merge_metadata(symbol, &MetadataPatch::founders(meta.founders.clone()))?;
        }

        if written {
            info!(%symbol, "metadata backfilled from provider");
        }
        Ok(written)
    }

    fn cached_price(&self, symbol: &str) -> Option<f64> {
        self.store.get(symbol).and_then(|rec| rec.last_price)
    }

    fn fresh_cached_price(&self, symbol: &str) -> Option<f64> {
        let window = self.price_freshness?;
        let rec = self.store.get(symbol)?;
        let age = Utc::now().signed_duration_since(rec.price_timestamp?);
        if age >= TimeDelta::zero() && age <= window {
            rec.last_price
        } else {
            None
        }
    }
}

fn price_answer(symbol: &str, price: f64, source: Source) -> Reply {
    Reply::Answer {
        text: format!("The price of {symbol} is ${}.", format_usd(price)),
        source,
    }
}

fn describe(symbol: &str, rec: &CoinRecord) -> String {
    let launch = rec
        .launch_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let consensus = rec.consensus().unwrap_or("Unknown");
    let founders = if rec.has_founders() {
        rec.founders.join(", ")
    } else {
        "Unknown".to_string()
    };
    let description = rec
        .description()
        .unwrap_or("No detailed description available.");

    format!(
        "**{symbol} ({})**\n\n**Launch Year:** {launch}\n**Consensus:** {consensus}\n**Founders:** {founders}\n\n{description}",
        rec.coin
    )
}
