//! The variable substitution table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from integer key to substitution value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableTable {
    entries: BTreeMap<i64, String>,
}

impl VariableTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for the key.
    pub fn insert(&mut self, key: i64, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key, value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: i64, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a value.
    pub fn get(&self, key: i64) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    /// Check if a key is present.
    pub fn contains(&self, key: i64) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Serialize to `key|value|` lines in ascending key order.
    ///
    /// Loading the output with the same delimiter reproduces the table.
    pub fn to_lines(&self, delimiter: char) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&key.to_string());
            out.push(delimiter);
            out.push_str(value);
            out.push(delimiter);
            out.push('\n');
        }
        out
    }
}

impl FromIterator<(i64, String)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
