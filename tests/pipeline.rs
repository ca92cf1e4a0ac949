use async_trait::async_trait;
use chrono::Utc;
use crypto_agent::agent::{CLARIFICATION, INSUFFICIENT_METADATA, POLICY_REFUSAL};
use crypto_agent::{
    CoinMetadata, CryptoAgent, KnowledgeStore, MarketDataProvider, PriceQuote, Reply, Source,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Provider with canned answers that counts how often it is asked.
#[derive(Default)]
struct Scripted {
    prices: HashMap<String, f64>,
    metadata: HashMap<String, CoinMetadata>,
    price_calls: Arc<AtomicUsize>,
    metadata_calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    fn metadata(mut self, symbol: &str, description: Option<&str>, founders: &[&str]) -> Self {
        self.metadata.insert(
            symbol.to_string(),
            CoinMetadata {
                description: description.map(str::to_string),
                founders: founders.iter().map(|f| f.to_string()).collect(),
            },
        );
        self
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (self.price_calls.clone(), self.metadata_calls.clone())
    }
}

#[async_trait]
impl MarketDataProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_price(&self, symbol: &str) -> Option<PriceQuote> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.prices.get(symbol).map(|&price| PriceQuote {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
        })
    }

    async fn fetch_metadata(&self, symbol: &str) -> Option<CoinMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.get(symbol).cloned()
    }
}

const SEED: &str = r#"{
    "BTC": {
        "coin": "Bitcoin",
        "symbol": "BTC",
        "launch_year": 2009,
        "consensus": "Proof of Work",
        "founders": ["Satoshi Nakamoto"],
        "description": "Peer-to-peer electronic cash.",
        "last_price": 42000.0,
        "price_timestamp": "2024-01-01T00:00:00Z"
    },
    "ETH": {
        "coin": "Ethereum",
        "symbol": "ETH",
        "launch_year": 2015,
        "consensus": "Proof of Stake"
    },
    "SOL": {
        "coin": "Solana",
        "symbol": "SOL",
        "launch_year": 2020,
        "consensus": "Proof of Stake + Proof of History",
        "founders": ["Anatoly Yakovenko"],
        "description": "High-throughput chain."
    },
    "DEFAULT": {"image_query": "cryptocurrency history"}
}"#;

fn seed_kb(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("crypto_kb.json");
    fs::write(&path, SEED).unwrap();
    path
}

fn agent(path: &Path, provider: Scripted) -> CryptoAgent {
    CryptoAgent::new(KnowledgeStore::open(path).unwrap(), Box::new(provider), 10)
}

fn persisted(path: &Path, symbol: &str) -> serde_json::Value {
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    doc[symbol].clone()
}

#[tokio::test]
async fn metadata_from_knowledge_base() {
    let dir = TempDir::new().unwrap();
    let provider = Scripted::default();
    let (prices, metas) = provider.counters();
    let mut agent = agent(&seed_kb(&dir), provider);

    let text = agent.process_query("Tell me about Bitcoin").await.unwrap();

    assert!(text.contains("Proof of Work"));
    assert!(text.contains("**BTC (Bitcoin)**"));
    assert!(text.contains("Satoshi Nakamoto"));
    assert!(text.ends_with("[Source: Knowledge Base]"));
    assert_eq!(prices.load(Ordering::SeqCst), 0);
    assert_eq!(metas.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn price_is_fetched_and_written_through() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    let mut agent = agent(&path, Scripted::default().price("SOL", 95.0));

    let text = agent
        .process_query("What is the price of Solana?")
        .await
        .unwrap();

    assert!(text.contains("$95.00"));
    assert!(text.ends_with("[Source: FreeCryptoAPI]"));

    let sol = persisted(&path, "SOL");
    assert_eq!(sol["last_price"], 95.0);
    assert!(sol["price_timestamp"].as_str().is_some());
    // metadata survives the price update
    assert_eq!(sol["consensus"], "Proof of Stake + Proof of History");
}

#[tokio::test]
async fn price_for_unknown_symbol_creates_a_record() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    let mut agent = agent(&path, Scripted::default().price("DOGE", 0.08));

    let reply = agent.handle("How much is DOGE worth?").await.unwrap();

    assert_eq!(reply.source(), Some(Source::RemoteProvider));
    assert!(reply.to_string().contains("$0.08"));
    assert_eq!(persisted(&path, "DOGE")["symbol"], "DOGE");
}

#[tokio::test]
async fn cached_price_when_provider_fails() {
    let dir = TempDir::new().unwrap();
    let mut agent = agent(&seed_kb(&dir), Scripted::default());

    let reply = agent.handle("BTC price").await.unwrap();

    assert_eq!(reply.source(), Some(Source::KnowledgeBase));
    assert!(reply.to_string().contains("$42000.00"));
}

#[tokio::test]
async fn fresh_cached_price_skips_provider() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    {
        let mut store = KnowledgeStore::open(&path).unwrap();
        store.update_price("ETH", 2300.0, Utc::now()).unwrap();
    }
    let provider = Scripted::default().price("ETH", 9999.0);
    let (prices, _) = provider.counters();
    let mut agent = agent(&path, provider).with_price_freshness(Duration::from_secs(300));

    let reply = agent.handle("price of ETH").await.unwrap();

    assert_eq!(reply.source(), Some(Source::KnowledgeBase));
    assert!(reply.to_string().contains("$2300.00"));
    assert_eq!(prices.load(Ordering::SeqCst), 0);

    // stale prices still go to the provider
    let reply = agent.handle("price of BTC").await.unwrap();
    assert_eq!(prices.load(Ordering::SeqCst), 1);
    assert_eq!(reply.source(), Some(Source::KnowledgeBase));
}

#[tokio::test]
async fn speculative_question_is_refused_without_remote_calls() {
    let dir = TempDir::new().unwrap();
    let provider = Scripted::default().price("BTC", 1.0);
    let (prices, metas) = provider.counters();
    let mut agent = agent(&seed_kb(&dir), provider);

    let reply = agent.handle("Will Bitcoin go up next week?").await.unwrap();

    assert_eq!(reply, Reply::PolicyRefusal);
    assert_eq!(reply.to_string(), POLICY_REFUSAL);
    assert_eq!(prices.load(Ordering::SeqCst), 0);
    assert_eq!(metas.load(Ordering::SeqCst), 0);
    assert_eq!(agent.context().history_len(), 0);
}

#[tokio::test]
async fn missing_entity_asks_for_clarification() {
    let dir = TempDir::new().unwrap();
    let mut agent = agent(&seed_kb(&dir), Scripted::default());

    let text = agent.process_query("What is the price?").await.unwrap();

    assert_eq!(text, CLARIFICATION);
}

#[tokio::test]
async fn pronoun_follows_previous_answer() {
    let dir = TempDir::new().unwrap();
    let mut agent = agent(&seed_kb(&dir), Scripted::default().price("ETH", 2300.0));

    agent.handle("Tell me about Ethereum").await.unwrap();
    let text = agent.process_query("What is its price?").await.unwrap();

    assert_eq!(text, "The price of ETH is $2300.00. [Source: FreeCryptoAPI]");
    assert_eq!(agent.context().last_entity(), Some("ETH"));
}

#[tokio::test]
async fn explicit_mention_beats_pronoun() {
    let dir = TempDir::new().unwrap();
    let provider = Scripted::default()
        .price("ETH", 2300.0)
        .price("BTC", 43_500.0);
    let mut agent = agent(&seed_kb(&dir), provider);

    agent.handle("Tell me about Ethereum").await.unwrap();
    let text = agent
        .process_query("Is it cheaper than the BTC price?")
        .await
        .unwrap();

    assert!(text.starts_with("The price of BTC is $43500.00."));
    assert_eq!(agent.context().last_entity(), Some("BTC"));
}

#[tokio::test]
async fn backfill_happens_once() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    let provider = Scripted::default().metadata(
        "ETH",
        Some("Programmable money."),
        &["Vitalik Buterin"],
    );
    let (_, metas) = provider.counters();
    let mut agent = agent(&path, provider);

    let first = agent.handle("Tell me about Ethereum").await.unwrap();
    assert_eq!(first.source(), Some(Source::RemoteProviderMetadata));
    assert!(first.to_string().contains("Programmable money."));
    assert!(first.to_string().contains("Vitalik Buterin"));
    assert_eq!(metas.load(Ordering::SeqCst), 1);

    let eth = persisted(&path, "ETH");
    assert_eq!(eth["description"], "Programmable money.");
    assert_eq!(eth["consensus"], "Proof of Stake");

    let second = agent.handle("Tell me about Ethereum").await.unwrap();
    assert_eq!(second.source(), Some(Source::KnowledgeBase));
    assert_eq!(metas.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn backfill_never_overwrites_existing_fields() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    fs::write(
        &path,
        r#"{"BTC": {"coin": "Bitcoin", "description": "Digital gold."}}"#,
    )
    .unwrap();
    let provider = Scripted::default().metadata(
        "BTC",
        Some("Something else entirely."),
        &["Satoshi Nakamoto"],
    );
    let mut agent = agent(&path, provider);

    let text = agent.process_query("Tell me about BTC").await.unwrap();

    assert!(text.contains("Digital gold."));
    assert!(!text.contains("Something else"));
    assert!(text.contains("Satoshi Nakamoto"));
    assert_eq!(persisted(&path, "BTC")["description"], "Digital gold.");
}

#[tokio::test]
async fn unknown_coin_metadata_comes_from_provider() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    let provider = Scripted::default().metadata("DOT", Some("Multichain network."), &[]);
    let (_, metas) = provider.counters();
    let mut agent = agent(&path, provider);

    let reply = agent.handle("Tell me about DOT").await.unwrap();

    assert_eq!(reply.source(), Some(Source::RemoteProviderMetadata));
    assert!(reply.to_string().contains("Multichain network."));
    assert!(reply.to_string().contains("**Founders:** Unknown"));
    assert_eq!(metas.load(Ordering::SeqCst), 1);
    assert_eq!(persisted(&path, "DOT")["description"], "Multichain network.");
}

#[tokio::test]
async fn unknown_coin_without_metadata_is_insufficient() {
    let dir = TempDir::new().unwrap();
    let mut agent = agent(&seed_kb(&dir), Scripted::default());

    let text = agent.process_query("Tell me about Cardano").await.unwrap();

    assert_eq!(text, INSUFFICIENT_METADATA);
}

#[tokio::test]
async fn history_is_bounded() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    let mut agent = CryptoAgent::new(
        KnowledgeStore::open(&path).unwrap(),
        Box::new(Scripted::default()),
        4,
    );

    for question in ["Tell me about BTC", "Tell me about SOL", "Tell me about ETH"] {
        agent.handle(question).await.unwrap();
    }

    assert_eq!(agent.context().history_len(), 4);
    let first = agent.context().history().next().unwrap();
    assert_eq!(first.content, "Tell me about SOL");
}

#[tokio::test]
async fn gap_left_unfilled_keeps_knowledge_base_source() {
    let dir = TempDir::new().unwrap();
    let path = seed_kb(&dir);
    fs::write(
        &path,
        r#"{"BTC": {"coin": "Bitcoin", "description": "Digital gold."}}"#,
    )
    .unwrap();
    let before = fs::read_to_string(&path).unwrap();
    // description only, no founders: nothing the record is missing
    let provider = Scripted::default().metadata("BTC", Some("Another description."), &[]);
    let (_, metas) = provider.counters();
    let mut agent = agent(&path, provider);

    let text = agent.process_query("Tell me about Bitcoin").await.unwrap();

    assert!(text.ends_with("[Source: Knowledge Base]"));
    assert!(text.contains("Digital gold."));
    assert!(text.contains("**Founders:** Unknown"));
    assert_eq!(metas.load(Ordering::SeqCst), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}
