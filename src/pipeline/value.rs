//! Values threaded between steps
//!
//! A step's extracted value is the only state carried forward. Values are
//! stored under the producing step's output key and never overwritten.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single extracted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepValue {
    /// Textual identifier, e.g. a repository full name
    Text(String),
    /// Numeric identifier, e.g. an issue number
    Number(u64),
    /// The step succeeded without producing a value
    Unit,
}

impl StepValue {
    /// The text value, if this is one
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, if this is one
    #[must_use]
    pub const fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for StepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Unit => f.write_str("-"),
        }
    }
}

/// Append-only map of output key → value accumulated during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, StepValue>);

impl Values {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value under `key`.
    ///
    /// Returns `false` and leaves the existing value untouched if the key
    /// was already produced earlier in the run.
    pub fn insert(&mut self, key: &str, value: StepValue) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    /// Look up a value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StepValue> {
        self.0.get(key)
    }

    /// Look up a text value by key
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StepValue::as_text)
    }

    /// Look up a numeric value by key
    #[must_use]
    pub fn number(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(StepValue::as_number)
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been produced yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
