//! Keyword intent classification.

use serde::Serialize;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Price,
    Metadata,
    /// Speculative or advisory question; always refused.
    Unknown,
}

const PRICE_KEYWORDS: &[&str] = &["price", "worth", "value", "cost", "how much"];

const METADATA_KEYWORDS: &[&str] = &[
    "metadata",
    "consensus",
    "launch",
    "year",
    "what is",
    "tell me about",
    "who is",
];

const REJECTION_KEYWORDS: &[&str] = &[
    "prediction",
    "invest",
    "buy",
    "sell",
    "future",
    "will",
    "go up",
    "next week",
    "should i",
];

/// Evaluated top to bottom; the first rule with a matching keyword decides.
/// Rejection sits last so a price or metadata signal always wins over it.
const RULES: &[(&[&str], Intent)] = &[
    (PRICE_KEYWORDS, Intent::Price),
    (METADATA_KEYWORDS, Intent::Metadata),
    (REJECTION_KEYWORDS, Intent::Unknown),
];

/// Intent used when no keyword matches at all: an implicit "tell me about X".
const FALLBACK: Intent = Intent::Metadata;

pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, intent)| *intent)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_questions() {
        assert_eq!(classify("What is the price of Solana?"), Intent::Price);
        assert_eq!(classify("How much is ETH"), Intent::Price);
        assert_eq!(classify("what's BTC worth"), Intent::Price);
    }

    #[test]
    fn metadata_questions() {
        assert_eq!(classify("Tell me about Bitcoin"), Intent::Metadata);
        assert_eq!(classify("Which consensus does ADA use?"), Intent::Metadata);
        assert_eq!(classify("Who is behind it?"), Intent::Metadata);
    }

    #[test]
    fn speculative_questions_are_rejected() {
        assert_eq!(classify("Will Bitcoin go up next week?"), Intent::Unknown);
        assert_eq!(classify("Should I buy DOGE"), Intent::Unknown);
        assert_eq!(classify("prediction for SOL"), Intent::Unknown);
    }

    #[test]
    fn price_signal_beats_rejection_words() {
        assert_eq!(
            classify("Should I buy BTC at this price?"),
            Intent::Price
        );
    }

    #[test]
    fn metadata_signal_beats_rejection_words() {
        assert_eq!(classify("what is the future of ETH"), Intent::Metadata);
    }

    #[test]
    fn no_keyword_defaults_to_metadata() {
        assert_eq!(classify("Cardano"), Intent::Metadata);
        assert_eq!(classify(""), Intent::Metadata);
    }
}
