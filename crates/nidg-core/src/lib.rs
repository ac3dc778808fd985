//! # nidg-core — Foundational Types for the NID Gateway
//!
//! Domain-primitive newtypes shared across the gateway crates. Each
//! identifier is a distinct type: you cannot pass an unvalidated string
//! where a [`NidNumber`] is expected, and an invalid value cannot be
//! constructed in the first place.
//!
//! ## Validation
//!
//! String-based types ([`NidNumber`], [`EnglishName`]) validate at
//! construction time and at deserialization. UUID-based types
//! ([`RequestId`]) are always valid by construction.

pub mod error;
pub mod identity;

pub use error::ValidationError;
pub use identity::{EnglishName, IdChannel, NidNumber, RequestId};
