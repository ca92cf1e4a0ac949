use crate::provider::{parse_provider_kind, ProviderKind};
use clap::{Args, Parser, Subcommand, ValueHint};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_KB_PATH: &str = "data/crypto_kb.json";
pub const DEFAULT_PROVIDER: &str = "coingecko";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Crypto Agent - answers price and metadata questions about cryptocurrencies
///
/// Every answer comes from the local knowledge base or the remote price
/// provider, and says which one. Speculative questions are refused.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub(crate) agent: AgentArgs,

    /// Defaults to `chat`
    #[command(subcommand)]
    pub(crate) cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Interactive question/answer session
    Chat,

    /// Answer a single question and exit
    Ask(AskArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub(crate) struct AgentArgs {
    /// Path to the knowledge base JSON file
    #[arg(
        long = "kb-path",
        env = "CRYPTO_KB_PATH",
        value_hint = ValueHint::FilePath,
        default_value = DEFAULT_KB_PATH,
        global = true
    )]
    pub(crate) kb_path: PathBuf,

    /// Remote data provider.
    /// - coingecko: live CoinGecko API
    /// - mock: offline reference prices, no metadata
    #[arg(
        long = "provider",
        env = "CRYPTO_PROVIDER",
        value_parser = parse_provider_kind,
        default_value = DEFAULT_PROVIDER,
        global = true
    )]
    pub(crate) provider: ProviderKind,

    /// CoinGecko API root
    #[arg(
        long = "coingecko-url",
        env = "COINGECKO_API_URL",
        value_hint = ValueHint::Url,
        global = true
    )]
    pub(crate) coingecko_url: Option<String>,

    /// Fiat currency prices are quoted in
    #[arg(
        long = "vs-currency",
        env = "CRYPTO_VS_CURRENCY",
        default_value = "usd",
        global = true
    )]
    pub(crate) vs_currency: String,

    /// Provider request timeout in seconds
    #[arg(
        long = "timeout-secs",
        env = "PROVIDER_TIMEOUT_SECS",
        default_value = "10",
        global = true
    )]
    pub(crate) timeout_secs: u64,

    /// Number of conversation turns kept for context
    #[arg(
        long = "history-limit",
        env = "HISTORY_LIMIT",
        default_value = "10",
        global = true
    )]
    pub(crate) history_limit: usize,

    /// Serve cached prices younger than this many seconds without asking the
    /// provider. Unset: always revalidate.
    #[arg(long = "price-freshness-secs", env = "PRICE_FRESHNESS_SECS", global = true)]
    pub(crate) price_freshness_secs: Option<u64>,

    /// Add ±2% noise to mock prices
    #[arg(long = "mock-jitter", default_value = "false", global = true)]
    pub(crate) mock_jitter: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AskArgs {
    /// The question, e.g. "What is the price of Solana?"
    #[arg(required = true, num_args = 1..)]
    pub(crate) question: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", env = "CRYPTO_AGENT_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub(crate) bind: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_chat_with_coingecko() {
        let cli = Cli::try_parse_from(["crypto-agent"]).unwrap();
        assert!(cli.cmd.is_none());
        assert_eq!(cli.agent.provider, ProviderKind::CoinGecko);
        assert_eq!(cli.agent.history_limit, 10);
    }

    #[test]
    fn ask_joins_words_and_accepts_global_flags() {
        let cli = Cli::try_parse_from([
            "crypto-agent",
            "ask",
            "price",
            "of",
            "btc",
            "--provider",
            "mock",
        ])
        .unwrap();
        assert_eq!(cli.agent.provider, ProviderKind::Mock);
        match cli.cmd {
            Some(Command::Ask(args)) => assert_eq!(args.question.join(" "), "price of btc"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["crypto-agent", "--provider", "binance"]).is_err());
    }
}
