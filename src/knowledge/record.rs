use crate::utils::serialization::{
    de_opt_f64, de_opt_timestamp, de_opt_year, de_string_or_null, de_vec_string_flexible,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the store knows about one coin.
///
/// Only `coin` is guaranteed; price and metadata fields fill in independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub coin: String,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_opt_year")]
    pub launch_year: Option<i32>,
    #[serde(default)]
    pub consensus: Option<String>,
    #[serde(default, deserialize_with = "de_vec_string_flexible")]
    pub founders: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub price_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl CoinRecord {
    /// Minimal record for a symbol we only know by ticker.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            coin: symbol.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn consensus(&self) -> Option<&str> {
        non_empty(self.consensus.as_deref())
    }

    pub fn image_query(&self) -> Option<&str> {
        non_empty(self.image_query.as_deref())
    }

    pub fn icon_url(&self) -> Option<&str> {
        non_empty(self.icon_url.as_deref())
    }

    pub fn has_founders(&self) -> bool {
        self.founders.iter().any(|f| !f.trim().is_empty())
    }

    /// Apply the non-empty fields of `patch`. Returns whether anything changed.
    pub fn apply(&mut self, patch: &MetadataPatch) -> bool {
        let mut changed = false;
        changed |= set_text(&mut self.coin, patch.coin.as_deref());
        changed |= set_opt_text(&mut self.consensus, patch.consensus.as_deref());
        changed |= set_opt_text(&mut self.description, patch.description.as_deref());
        changed |= set_opt_text(&mut self.image_query, patch.image_query.as_deref());
        changed |= set_opt_text(&mut self.icon_url, patch.icon_url.as_deref());

        if let Some(year) = patch.launch_year {
            if self.launch_year != Some(year) {
                self.launch_year = Some(year);
                changed = true;
            }
        }

        if let Some(founders) = &patch.founders {
            let founders: Vec<String> = founders
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            if !founders.is_empty() && founders != self.founders {
                self.founders = founders;
                changed = true;
            }
        }

        changed
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn set_text(slot: &mut String, value: Option<&str>) -> bool {
    match non_empty(value) {
        Some(v) if slot != v => {
            *slot = v.to_string();
            true
        }
        _ => false,
    }
}

fn set_opt_text(slot: &mut Option<String>, value: Option<&str>) -> bool {
    match non_empty(value) {
        Some(v) if slot.as_deref() != Some(v) => {
            *slot = Some(v.to_string());
            true
        }
        _ => false,
    }
}

/// Partial metadata update. `None` and empty values never reach the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub coin: Option<String>,
    pub launch_year: Option<i32>,
    pub consensus: Option<String>,
    pub founders: Option<Vec<String>>,
    pub description: Option<String>,
    pub image_query: Option<String>,
    pub icon_url: Option<String>,
}

impl MetadataPatch {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn founders(founders: Vec<String>) -> Self {
        Self {
            founders: Some(founders),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitcoin() -> CoinRecord {
        CoinRecord {
            coin: "Bitcoin".into(),
            symbol: "BTC".into(),
            launch_year: Some(2009),
            consensus: Some("Proof of Work".into()),
            founders: vec!["Satoshi Nakamoto".into()],
            description: Some("Peer-to-peer electronic cash.".into()),
            ..CoinRecord::default()
        }
    }

    #[test]
    fn empty_values_never_clobber() {
        let mut rec = bitcoin();
        let patch = MetadataPatch {
            description: Some("   ".into()),
            founders: Some(vec![]),
            consensus: Some(String::new()),
            ..MetadataPatch::default()
        };
        assert!(!rec.apply(&patch));
        assert_eq!(rec, bitcoin());
    }

    #[test]
    fn present_fields_are_written() {
        let mut rec = CoinRecord::placeholder("SOL");
        let changed = rec.apply(&MetadataPatch {
            coin: Some("Solana".into()),
            founders: Some(vec!["Anatoly Yakovenko".into(), " ".into()]),
            ..MetadataPatch::default()
        });
        assert!(changed);
        assert_eq!(rec.coin, "Solana");
        assert_eq!(rec.founders, vec!["Anatoly Yakovenko".to_string()]);
        assert_eq!(rec.description(), None);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut rec = bitcoin();
        rec.description = None;
        let patch = MetadataPatch::description("Digital gold.");
        assert!(rec.apply(&patch));
        let once = rec.clone();
        assert!(!rec.apply(&patch));
        assert_eq!(rec, once);
        assert_eq!(rec.founders, vec!["Satoshi Nakamoto".to_string()]);
    }

    #[test]
    fn persisted_shape_round_trips() {
        let json = r#"{
            "coin": "Bitcoin",
            "symbol": "BTC",
            "launch_year": 2009,
            "consensus": "Proof of Work",
            "founders": ["Satoshi Nakamoto"],
            "last_price": 43500.0,
            "price_timestamp": "2024-01-15T10:30:00Z",
            "image_query": "bitcoin gold coin",
            "icon_url": "https://example.org/btc.png"
        }"#;
        let rec: CoinRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.last_price, Some(43500.0));
        assert_eq!(
            rec.price_timestamp.unwrap().to_rfc3339(),
            "2024-01-15T10:30:00+00:00"
        );
        assert_eq!(rec.icon_url(), Some("https://example.org/btc.png"));

        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(out["price_timestamp"], "2024-01-15T10:30:00Z");
        assert_eq!(out["founders"][0], "Satoshi Nakamoto");
    }
}
