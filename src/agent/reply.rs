//! What the agent says back.

use serde::Serialize;
use std::fmt;
use strum::Display;

pub const POLICY_REFUSAL: &str = "I'm sorry, I can only provide crypto prices and metadata. I cannot answer hypothetical questions or give investment advice.";

pub const CLARIFICATION: &str = "I'm not sure which cryptocurrency you are asking about. Could you specify the name or symbol?";

pub const INSUFFICIENT_PRICE: &str = "INSUFFICIENT DATA – Not found in Knowledge Base or API";

pub const INSUFFICIENT_METADATA: &str =
    "INSUFFICIENT DATA – Metadata not found in Knowledge Base or API";

/// Where the facts in an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Source {
    #[strum(to_string = "Knowledge Base")]
    KnowledgeBase,
    #[strum(to_string = "FreeCryptoAPI")]
    RemoteProvider,
    #[strum(to_string = "FreeCryptoAPI (Metadata)")]
    RemoteProviderMetadata,
}

impl Source {
    /// The `[Source: …]` suffix appended to every factual answer.
    pub fn tag(&self) -> String {
        format!("[Source: {self}]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingData {
    Price,
    Metadata,
}

/// Terminal outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Speculative or advisory question.
    PolicyRefusal,
    /// No coin could be resolved.
    Clarification,
    /// Neither the store nor the provider had the needed datum.
    InsufficientData(MissingData),
    /// A factual answer and its origin.
    Answer { text: String, source: Source },
}

impl Reply {
    pub fn source(&self) -> Option<Source> {
        match self {
            Reply::Answer { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Reply::Answer { .. })
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::PolicyRefusal => f.write_str(POLICY_REFUSAL),
            Reply::Clarification => f.write_str(CLARIFICATION),
            Reply::InsufficientData(MissingData::Price) => f.write_str(INSUFFICIENT_PRICE),
            Reply::InsufficientData(MissingData::Metadata) => f.write_str(INSUFFICIENT_METADATA),
            Reply::Answer { text, source } => write!(f, "{text} {}", source.tag()),
        }
    }
}

/// Dollar amount: cents at or above $1, up to eight decimals below.
pub fn format_usd(price: f64) -> String {
    if price.abs() >= 1.0 {
        return format!("{price:.2}");
    }
    let mut s = format!("{price:.8}");
    while s.ends_with('0') && s.len() - s.find('.').map_or(s.len(), |i| i + 1) > 2 {
        s.pop();
    }
    s
}
