//! The local knowledge store: one JSON document, symbol → [`CoinRecord`].
//!
//! Every mutation rewrites the file before returning, so a read that follows
//! a write always sees it, on disk and in memory.

mod record;

pub use record::{CoinRecord, MetadataPatch};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Entry holding fallback media hints; never resolved as a coin.
pub const DEFAULT_KEY: &str = "DEFAULT";

#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    /// `None` keeps the store in memory only.
    path: Option<PathBuf>,
    records: BTreeMap<String, CoinRecord>,
    /// Entries that failed to decode. Written back untouched.
    undecoded: BTreeMap<String, Value>,
    /// The file on disk is not JSON at all; it is moved aside before the first write.
    unreadable: bool,
}

impl KnowledgeStore {
    /// Load the store from `path`. A missing file is an empty store.
    ///
    /// Records are decoded one by one: an entry that does not fit
    /// [`CoinRecord`] is logged and kept verbatim for the next write. A file
    /// that is not JSON at all yields an empty store and is renamed to
    /// `<path>.corrupt` before anything is written over it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self {
            path: Some(path.clone()),
            ..Self::default()
        };

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(document) => {
                    let (records, undecoded) = decode_records(document, &path);
                    store.records = normalise(records);
                    store.undecoded = undecoded;
                }
                Err(e) => {
                    warn!(
                        "Error decoding {}: {e}; starting with empty knowledge base",
                        path.display()
                    );
                    store.unreadable = true;
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found; starting with empty knowledge base", path.display());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        }

        info!(
            coins = store.symbols().count(),
            undecoded = store.undecoded.len(),
            "Knowledge base loaded from {}",
            path.display()
        );
        Ok(store)
    }

    /// A store that is never written to disk.
    pub fn in_memory(records: BTreeMap<String, CoinRecord>) -> Self {
        Self {
            records: normalise(records),
            ..Self::default()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, symbol: &str) -> Option<&CoinRecord> {
        let key = symbol.trim().to_ascii_uppercase();
        if key == DEFAULT_KEY {
            return None;
        }
        self.records.get(&key)
    }

    /// The `DEFAULT` entry, if the file has one.
    pub fn default_hints(&self) -> Option<&CoinRecord> {
        self.records.get(DEFAULT_KEY)
    }

    /// Coin symbols, without the `DEFAULT` entry.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.records
            .keys()
            .map(String::as_str)
            .filter(|k| *k != DEFAULT_KEY)
    }

    /// (name, symbol) pairs for entity resolution.
    pub fn name_index(&self) -> Vec<(String, String)> {
        self.records
            .iter()
            .filter(|(k, _)| k.as_str() != DEFAULT_KEY)
            .map(|(k, rec)| (rec.coin.clone(), k.clone()))
            .collect()
    }

    /// Record a fresh price, creating a minimal record for unknown symbols.
    pub fn update_price(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let key = symbol.trim().to_ascii_uppercase();
        self.forget_undecoded(&key);
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| CoinRecord::placeholder(&key));
        record.last_price = Some(price);
        record.price_timestamp = Some(timestamp);

        self.save()
            .with_context(|| format!("Failed to persist price for {key}"))
    }

    /// Create or update a record with the non-empty fields of `patch`.
    /// Returns whether the record changed.
    pub fn merge_metadata(&mut self, symbol: &str, patch: &MetadataPatch) -> Result<bool> {
        let key = symbol.trim().to_ascii_uppercase();
        self.forget_undecoded(&key);
        let mut created = false;
        let record = self.records.entry(key.clone()).or_insert_with(|| {
            created = true;
            CoinRecord::placeholder(&key)
        });
        let changed = record.apply(patch) || created;

        if changed {
            self.save()
                .with_context(|| format!("Failed to persist metadata for {key}"))?;
        }
        Ok(changed)
    }

    /// A fresh record for `key` replaces an entry that could not be decoded.
    fn forget_undecoded(&mut self, key: &str) {
        if self.undecoded.remove(key).is_some() {
            warn!("Replacing undecodable knowledge base entry {key}");
        }
    }

    /// Write the whole document through a temp file, then rename over the target.
    fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if self.unreadable {
            move_aside(&path)?;
            self.unreadable = false;
        }

        let mut document = self.undecoded.clone();
        for (key, record) in &self.records {
            let value = serde_json::to_value(record)
                .with_context(|| format!("Failed to serialize record {key}"))?;
            document.insert(key.clone(), value);
        }
        let content =
            serde_json::to_string_pretty(&document).context("Failed to serialize knowledge base")?;

        let tmp = sibling(&path, ".tmp");
        fs::write(&tmp, content.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Knowledge base saved to {}", path.display());
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Keep an unreadable knowledge file as `<path>.corrupt`.
fn move_aside(path: &Path) -> Result<()> {
    let target = sibling(path, ".corrupt");
    match fs::rename(path, &target) {
        Ok(()) => {
            warn!("Moved unreadable {} to {}", path.display(), target.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to move {} aside", path.display())),
    }
}

/// Decode each entry on its own; entries that do not fit are returned raw.
fn decode_records(
    document: BTreeMap<String, Value>,
    path: &Path,
) -> (BTreeMap<String, CoinRecord>, BTreeMap<String, Value>) {
    let mut records = BTreeMap::new();
    let mut undecoded = BTreeMap::new();

    for (key, value) in document {
        match CoinRecord::deserialize(&value) {
            Ok(record) => {
                records.insert(key, record);
            }
            Err(e) => {
                warn!("Skipping entry {key} in {}: {e}", path.display());
                undecoded.insert(key.trim().to_ascii_uppercase(), value);
            }
        }
    }

    (records, undecoded)
}

/// Uppercase keys and make sure every coin record carries its symbol and a name.
fn normalise(records: BTreeMap<String, CoinRecord>) -> BTreeMap<String, CoinRecord> {
    records
        .into_iter()
        .map(|(key, mut rec)| {
            let key = key.trim().to_ascii_uppercase();
            if key != DEFAULT_KEY {
                if rec.symbol.trim().is_empty() {
                    rec.symbol = key.clone();
                }
                if rec.coin.trim().is_empty() {
                    rec.coin = key.clone();
                }
            }
            (key, rec)
        })
        .collect()
}
