//! Route modules for the gateway API.

pub mod stats;
pub mod verification;
