use crate::knowledge::{CoinRecord, KnowledgeStore};
use serde::{Deserialize, Serialize};

const FALLBACK_IMAGE_QUERY: &str = "cryptocurrency blockchain";
const FALLBACK_COIN_NAME: &str = "Cryptocurrency";

/// Image search query and icon for the UI's backdrop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHints {
    pub image_query: String,
    pub icon_url: String,
    pub coin_name: String,
}

impl MediaHints {
    fn for_record(record: &CoinRecord) -> Self {
        Self {
            image_query: record
                .image_query()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} cryptocurrency", record.coin)),
            icon_url: record.icon_url().unwrap_or_default().to_string(),
            coin_name: record.coin.clone(),
        }
    }

    /// Hints from the store's `DEFAULT` entry, or built-in ones without it.
    fn fallback(store: &KnowledgeStore) -> Self {
        let default = store.default_hints();
        Self {
            image_query: default
                .and_then(CoinRecord::image_query)
                .unwrap_or(FALLBACK_IMAGE_QUERY)
                .to_string(),
            icon_url: default
                .and_then(CoinRecord::icon_url)
                .unwrap_or_default()
                .to_string(),
            coin_name: FALLBACK_COIN_NAME.to_string(),
        }
    }
}

pub(crate) fn hints_for(store: &KnowledgeStore, symbol: Option<&str>) -> MediaHints {
    symbol
        .and_then(|s| store.get(s))
        .map(MediaHints::for_record)
        .unwrap_or_else(|| MediaHints::fallback(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn store() -> KnowledgeStore {
        let records: BTreeMap<String, CoinRecord> = serde_json::from_str(
            r#"{
                "BTC": {"coin": "Bitcoin", "icon_url": "https://icons.example/btc.png"},
                "ETH": {"coin": "Ethereum", "image_query": "ethereum network"},
                "DEFAULT": {"image_query": "history of money", "icon_url": "https://icons.example/coin.png"}
            }"#,
        )
        .unwrap();
        KnowledgeStore::in_memory(records)
    }

    #[test]
    fn record_hints_fill_in_image_query() {
        let hints = hints_for(&store(), Some("BTC"));
        assert_eq!(hints.image_query, "Bitcoin cryptocurrency");
        assert_eq!(hints.icon_url, "https://icons.example/btc.png");
        assert_eq!(hints.coin_name, "Bitcoin");

        let hints = hints_for(&store(), Some("ETH"));
        assert_eq!(hints.image_query, "ethereum network");
        assert_eq!(hints.icon_url, "");
    }

    #[test]
    fn unknown_entity_uses_default_entry() {
        let hints = hints_for(&store(), None);
        assert_eq!(hints.image_query, "history of money");
        assert_eq!(hints.coin_name, "Cryptocurrency");

        let hints = hints_for(&store(), Some("XRP"));
        assert_eq!(hints.icon_url, "https://icons.example/coin.png");
    }

    #[test]
    fn no_default_entry_uses_builtin_hints() {
        let hints = hints_for(&KnowledgeStore::default(), None);
        assert_eq!(hints.image_query, FALLBACK_IMAGE_QUERY);
        assert_eq!(hints.icon_url, "");
    }
}
