//! Concurrency-safe symbol registries shared by all scan workers.
//!
//! Each registry maps a symbol name to the token that most recently observed
//! it. Writes are last-write-wins; the stored token only supplies a
//! representative location for reporting.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::token::Token;

/// A symbol name with the last token observed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub name: String,
    pub last_token: Token,
}

/// Name -> [`SymbolRecord`] map behind a single registry-wide lock.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    records: Mutex<HashMap<String, SymbolRecord>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `name`.
    pub fn set(&self, name: &str, token: &Token) {
        let record = SymbolRecord {
            name: name.to_string(),
            last_token: token.clone(),
        };
        self.records.lock().insert(name.to_string(), record);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.lock().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<SymbolRecord> {
        self.records.lock().get(name).cloned()
    }

    /// Point-in-time copy of every record.
    pub fn snapshot(&self) -> HashMap<String, SymbolRecord> {
        self.records.lock().clone()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

/// The two registries a scan publishes into.
#[derive(Debug, Default)]
pub struct Registries {
    pub definitions: SymbolRegistry,
    pub usages: SymbolRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}
