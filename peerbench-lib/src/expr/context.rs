use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;

/// A single caller-supplied value visible to custom validation predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FromStr for ContextValue {
    type Err = core::convert::Infallible;

    /// Parses `true`/`false` as flags, anything numeric as a number, and everything else as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(flag) = s.parse::<bool>() {
            return Ok(Self::Flag(flag));
        }

        if let Ok(number) = s.parse::<f64>() {
            return Ok(Self::Number(number));
        }

        Ok(Self::Text(s.to_string()))
    }
}

/// Named values that custom predicates can inspect alongside the metric value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationContext(BTreeMap<String, ContextValue>);

impl ValidationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: ContextValue) -> Self {
        let _ = self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ContextValue) -> Option<ContextValue> {
        self.0.insert(name.into(), value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic hash of the context contents, suitable as part of a memoization key.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (name, value) in &self.0 {
            name.hash(&mut hasher);
            match value {
                ContextValue::Flag(flag) => (0u8, *flag).hash(&mut hasher),
                ContextValue::Number(number) => (1u8, number.to_bits()).hash(&mut hasher),
                ContextValue::Text(text) => (2u8, text).hash(&mut hasher),
            }
        }
        hasher.finish()
    }
}

impl FromIterator<(String, ContextValue)> for ValidationContext {
    fn from_iter<T: IntoIterator<Item = (String, ContextValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
