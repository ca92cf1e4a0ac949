//! Turns raw user text into a [`ResolvedQuery`].

use crate::context::{ContextTracker, ResolvedBy};
use crate::intent::{classify, Intent};

/// One request's view of the user text. Dropped once the reply is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub raw_text: String,
    pub symbol: Option<String>,
    pub resolved_by: Option<ResolvedBy>,
    pub intent: Intent,
}

/// Resolve the entity (explicit mention first, pronoun as fallback) and classify intent.
pub fn resolve_query(context: &mut ContextTracker, text: &str) -> ResolvedQuery {
    let resolution = context.resolve(text);
    let intent = classify(text);

    let (symbol, resolved_by) = match resolution {
        Some(r) => (Some(r.symbol), Some(r.via)),
        None => (None, None),
    };

    ResolvedQuery {
        raw_text: text.to_string(),
        symbol,
        resolved_by,
        intent,
    }
}
