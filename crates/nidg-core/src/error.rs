//! Validation error hierarchy for the gateway's domain primitives.

use thiserror::Error;

/// Errors raised when a domain primitive fails construction-time
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The national ID number is not exactly 10 or 17 ASCII digits.
    #[error("invalid national ID number {0:?}: must be exactly 10 or 17 digits")]
    InvalidNid(String),

    /// The English name is empty, too long, or contains characters
    /// outside the Latin-script name alphabet.
    #[error("invalid English name {0:?}")]
    InvalidName(String),

    /// The date of birth is not a usable calendar date.
    #[error("invalid date of birth: {0}")]
    InvalidDateOfBirth(String),
}
