//! Conversation memory: bounded turn history plus the last discussed coin.
//!
//! Entity resolution lives here because the pronoun fallback needs the
//! tracker's memory, and every explicit mention has to refresh it.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use strum::Display;
use tracing::trace;

/// Default number of turns kept in memory.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Words that refer back to the last discussed coin.
const PRONOUNS: [&str; 4] = ["it", "this", "that", "its"];

const BUILTIN_SYMBOLS: [&str; 9] = [
    "BTC", "ETH", "SOL", "ADA", "XRP", "DOGE", "DOT", "USDT", "USDC",
];

const BUILTIN_NAMES: [(&str, &str); 6] = [
    ("Bitcoin", "BTC"),
    ("Ethereum", "ETH"),
    ("Solana", "SOL"),
    ("Cardano", "ADA"),
    ("Ripple", "XRP"),
    ("Dogecoin", "DOGE"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single utterance. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// How a symbol was found in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Symbol,
    Name,
    Pronoun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub symbol: String,
    pub via: ResolvedBy,
}

/// Known tickers and full names.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    symbols: HashSet<String>,
    /// (uppercase name, symbol), longest name first.
    names: Vec<(String, String)>,
}

impl Vocabulary {
    pub fn builtin() -> Self {
        let mut vocab = Self::default();
        for sym in BUILTIN_SYMBOLS {
            vocab.add_symbol(sym);
        }
        for (name, sym) in BUILTIN_NAMES {
            vocab.add_name(name, sym);
        }
        vocab
    }

    pub fn add_symbol(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_ascii_uppercase();
        if !symbol.is_empty() {
            self.symbols.insert(symbol);
        }
    }

    /// Register a full name. The first registration of a name wins.
    pub fn add_name(&mut self, name: &str, symbol: &str) {
        let name = name.trim().to_uppercase();
        let symbol = symbol.trim().to_ascii_uppercase();
        if name.is_empty() || symbol.is_empty() || self.names.iter().any(|(n, _)| *n == name) {
            return;
        }
        self.add_symbol(&symbol);
        self.names.push((name, symbol));
        // stable: equal lengths keep registration order
        self.names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// First token that is a known ticker.
    pub fn match_symbol(&self, text: &str) -> Option<String> {
        text.split_whitespace()
            .map(|word| trim_token(word).to_ascii_uppercase())
            .find(|token| self.symbols.contains(token))
    }

    /// Longest known full name contained in the text.
    pub fn match_name(&self, text: &str) -> Option<String> {
        let upper = text.to_uppercase();
        self.names
            .iter()
            .find(|(name, _)| upper.contains(name.as_str()))
            .map(|(_, symbol)| symbol.clone())
    }
}

fn trim_token(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

fn has_pronoun(text: &str) -> bool {
    text.split_whitespace()
        .map(|word| trim_token(word).to_lowercase())
        .any(|token| PRONOUNS.contains(&token.as_str()))
}

/// Bounded history plus sticky "last mentioned entity".
#[derive(Debug, Clone)]
pub struct ContextTracker {
    history: VecDeque<Turn>,
    capacity: usize,
    last_entity: Option<String>,
    vocabulary: Vocabulary,
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, Vocabulary::builtin())
    }
}

impl ContextTracker {
    pub fn new(capacity: usize, vocabulary: Vocabulary) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            last_entity: None,
            vocabulary,
        }
    }

    /// Append a turn, dropping the oldest ones beyond capacity.
    pub fn record_turn(&mut self, role: Role, content: impl Into<String>) {
        self.history.push_back(Turn {
            role,
            content: content.into(),
        });
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_entity(&self) -> Option<&str> {
        self.last_entity.as_deref()
    }

    /// Symbol mentioned in the text, or the remembered one for a pronoun.
    pub fn resolve_entity(&mut self, text: &str) -> Option<String> {
        self.resolve(text).map(|r| r.symbol)
    }

    /// Like [`Self::resolve_entity`], but also reports how the symbol was found.
    ///
    /// An explicit ticker or name always beats a pronoun in the same text.
    /// Explicit hits become the new last entity; pronoun hits leave it as is.
    pub fn resolve(&mut self, text: &str) -> Option<Resolution> {
        let explicit = self
            .vocabulary
            .match_symbol(text)
            .map(|symbol| (symbol, ResolvedBy::Symbol))
            .or_else(|| {
                self.vocabulary
                    .match_name(text)
                    .map(|symbol| (symbol, ResolvedBy::Name))
            });

        if let Some((symbol, via)) = explicit {
            trace!(%symbol, ?via, "explicit entity mention");
            self.last_entity = Some(symbol.clone());
            return Some(Resolution { symbol, via });
        }

        if has_pronoun(text) {
            return self.last_entity.clone().map(|symbol| {
                trace!(%symbol, "pronoun resolved from context");
                Resolution {
                    symbol,
                    via: ResolvedBy::Pronoun,
                }
            });
        }

        None
    }
}
