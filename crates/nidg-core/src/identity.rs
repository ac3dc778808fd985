//! # Identity Newtypes
//!
//! Domain primitives for the verification flow: the national ID number,
//! the Latin-script subject name, and the per-request correlation
//! identifier.
//!
//! ## Formats
//!
//! - National ID: 10-digit (smart card) or 17-digit (legacy) number.
//!   The digit count selects the identification channel on the registry
//!   wire, so no other length may exist at runtime.
//! - English name: the Latin-script name as printed on the ID card.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time, not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identification channel
// ---------------------------------------------------------------------------

/// Identification channel on the registry wire.
///
/// Selected by the ID number's digit count. This is a protocol dispatch
/// key, not a formatting choice left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdChannel {
    /// 10-digit smart card number, sent as `nid10Digit`.
    Nid10,
    /// 17-digit legacy number, sent as `nid17Digit`.
    Nid17,
}

impl std::fmt::Display for IdChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nid10 => write!(f, "10-digit"),
            Self::Nid17 => write!(f, "17-digit"),
        }
    }
}

// ---------------------------------------------------------------------------
// National ID number
// ---------------------------------------------------------------------------

/// A national ID number: exactly 10 or 17 ASCII digits.
///
/// The digit count is load-bearing (it picks the [`IdChannel`]), so the
/// constructor rejects every other length rather than defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NidNumber(String);

impl_validating_deserialize!(NidNumber);

impl NidNumber {
    /// Create a national ID number, validating the digit count.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNid`] unless the value is
    /// exactly 10 or 17 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid_length = s.len() == 10 || s.len() == 17;
        if !valid_length || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidNid(s));
        }
        Ok(Self(s))
    }

    /// The identification channel this number dispatches to.
    pub fn channel(&self) -> IdChannel {
        if self.0.len() == 10 {
            IdChannel::Nid10
        } else {
            IdChannel::Nid17
        }
    }

    /// Access the digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NidNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// English name
// ---------------------------------------------------------------------------

/// A Latin-script subject name, normalized at construction.
///
/// Leading/trailing whitespace is trimmed and internal runs of
/// whitespace collapse to a single space. The remaining characters must
/// come from the Latin name alphabet: ASCII letters, space, `.`, `-`,
/// `'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnglishName(String);

impl_validating_deserialize!(EnglishName);

impl EnglishName {
    /// Maximum stored length, matching the audit store column.
    const MAX_LEN: usize = 255;

    /// Create a normalized English name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidName`] when the normalized name
    /// is empty, longer than 255 characters, or contains characters
    /// outside the Latin name alphabet.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if normalized.is_empty() || normalized.len() > Self::MAX_LEN {
            return Err(ValidationError::InvalidName(raw));
        }
        let allowed = |c: char| c.is_ascii_alphabetic() || matches!(c, ' ' | '.' | '-' | '\'');
        if !normalized.chars().all(allowed) {
            return Err(ValidationError::InvalidName(raw));
        }

        Ok(Self(normalized))
    }

    /// Access the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EnglishName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Request correlation identifier
// ---------------------------------------------------------------------------

/// Correlation identifier for one inbound verification call.
///
/// One request yields exactly one result and one audit row, all carrying
/// the same `RequestId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random request identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a request identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}
