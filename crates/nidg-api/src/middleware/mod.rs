//! HTTP middleware for the gateway API.

pub mod allowlist;
