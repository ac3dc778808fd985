//! # nidg-registry-client — Registry Client for the NID Gateway
//!
//! Typed HTTP client for the third-party national identity registry.
//! Owns the whole outbound protocol so the service layer never touches
//! raw registry responses:
//!
//! - [`credentials`] — process-wide bearer token cache with
//!   single-flighted refresh
//! - [`registry`] — login exchange, demographic verification submission,
//!   response classification, bounded re-authentication on 401
//! - [`asset`] — photo inlining (remote URL to self-contained data URI)
//!
//! ## Concurrency
//!
//! [`RegistryClient`] is `Send + Sync` and designed to be shared behind
//! an `Arc` across async tasks. Concurrent verifications never serialize
//! on each other except during a credential refresh, which is guarded so
//! at most one login exchange is ever in flight.

pub mod asset;
pub mod config;
pub mod credentials;
pub mod error;
pub mod registry;
pub mod types;

pub use asset::EncodedAsset;
pub use config::RegistryConfig;
pub use credentials::CredentialCache;
pub use error::{AssetError, RegistryError};
pub use registry::RegistryClient;
pub use types::{FieldMatch, VerificationReport, VerificationRequest};
