//! Delta version identifiers.
//!
//! A delta id is either a monotonic number (`42`) or a version label
//! (`2024.03-add-index`). Numbers compare numerically, labels compare
//! lexically, and every number sorts before every label so that the ordering
//! is total across a mixed catalog.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Totally-ordered identifier of one versioned delta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeltaId {
    /// Numeric id, compared numerically (`9 < 10`).
    Number(u64),
    /// Version label, compared lexically.
    Label(String),
}

impl DeltaId {
    /// Parse an id from user input or a file stem.
    ///
    /// All-digit values become [`DeltaId::Number`]; anything else made of
    /// alphanumerics, `.`, `-` and `_` becomes a [`DeltaId::Label`].
    pub fn parse(value: &str) -> CoreResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(invalid(value, "delta id must not be empty"));
        }

        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse::<u64>()
                .map(DeltaId::Number)
                .map_err(|e| invalid(value, &e.to_string()));
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(invalid(value, &format!("unexpected character '{}'", bad)));
        }
        if trimmed.starts_with('.') {
            return Err(invalid(value, "delta id must not start with '.'"));
        }

        Ok(DeltaId::Label(trimmed.to_string()))
    }

    /// Numeric value, if this is a numeric id.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            DeltaId::Number(n) => Some(*n),
            DeltaId::Label(_) => None,
        }
    }
}

fn invalid(value: &str, reason: &str) -> CoreError {
    CoreError::InvalidDeltaId {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for DeltaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaId::Number(n) => write!(f, "{}", n),
            DeltaId::Label(s) => f.write_str(s),
        }
    }
}

impl FromStr for DeltaId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeltaId::parse(s)
    }
}

impl From<u64> for DeltaId {
    fn from(n: u64) -> Self {
        DeltaId::Number(n)
    }
}

impl Serialize for DeltaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeltaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML and JSON may hand us either a bare number or a string.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(DeltaId::Number(n)),
            Raw::Text(s) => DeltaId::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[path = "delta_id_test.rs"]
mod tests;
