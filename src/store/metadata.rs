//! Loosely structured record metadata.
//!
//! Metadata is a flat map of scalar values. Readers that expect a string
//! use [`Metadata::get_str_or_default`], which renders any scalar as text and
//! returns an empty string when the key is absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing ".0" on whole numbers.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
        }
    }
}

impl MetadataValue {
    /// False for `false`, zero and the empty string.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(x) => *x != 0.0,
            Self::Str(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Metadata attached to a stored vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<MetadataValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Read `key` as text, or `""` if it is absent.
    #[must_use]
    pub fn get_str_or_default(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_defaults_to_empty() {
        let meta = Metadata::new().with("brand", "Acme");
        assert_eq!(meta.get_str_or_default("brand"), "Acme");
        assert_eq!(meta.get_str_or_default("id"), "");
    }

    #[test]
    fn test_scalars_render_as_text() {
        let meta = Metadata::new()
            .with("id", 42_i64)
            .with("score", 3.0_f64)
            .with("active", true);

        assert_eq!(meta.get_str_or_default("id"), "42");
        assert_eq!(meta.get_str_or_default("score"), "3.0");
        assert_eq!(meta.get_str_or_default("active"), "True");
    }

    #[test]
    fn test_truthiness() {
        for value in [
            MetadataValue::Bool(false),
            MetadataValue::Int(0),
            MetadataValue::Float(0.0),
            MetadataValue::Float(-0.0),
            MetadataValue::Str(String::new()),
        ] {
            assert!(!value.is_truthy(), "{value:?}");
        }
        assert!(MetadataValue::Str("0".into()).is_truthy());
        assert!(MetadataValue::Int(-1).is_truthy());
        assert!(MetadataValue::Bool(true).is_truthy());
    }

    #[test]
    fn test_json_shape() {
        let meta = Metadata::new().with("id", "p-1").with("year", 2024_i64);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"id":"p-1","year":2024}"#);

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
