//! A question-answering agent for cryptocurrency prices and background facts.
//!
//! Answers are drawn from a local JSON knowledge base and a remote market data
//! provider. Every factual answer names its source, and anything speculative
//! or advisory is refused.

pub mod agent;
mod app;
mod args;
mod chat;
pub mod config;
pub mod context;
pub mod intent;
pub mod knowledge;
pub mod provider;
pub mod resolver;
pub mod server;
mod ui;
mod utils;

pub use agent::{CryptoAgent, MediaHints, Reply, Source};
pub use app::Application;
pub use args::Cli;
pub use chat::{run_ask, run_chat};
pub use config::{AgentConfig, ProviderConfig, ServeConfig};
pub use knowledge::{CoinRecord, KnowledgeStore};
pub use provider::{CoinMetadata, MarketDataProvider, PriceQuote};
pub use utils::init_logging;
pub use utils::io_input::{InputSource, StdinInputSource, VecInputSource};
