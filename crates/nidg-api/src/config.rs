//! Service configuration from the environment.

use std::net::SocketAddr;

use anyhow::Context as _;

use nidg_registry_client::RegistryConfig;

use crate::middleware::allowlist::Allowlist;

/// Environment-derived service configuration.
#[derive(Debug)]
pub struct ServiceConfig {
    /// Socket address to bind (`NIDG_BIND_ADDR`, default `0.0.0.0:8080`).
    pub bind_addr: SocketAddr,
    /// Registry client configuration; `None` when the registry
    /// environment variables are not set.
    pub registry: Option<RegistryConfig>,
    /// Registered client systems (`NIDG_ALLOWED_SYSTEMS`).
    pub allowlist: Allowlist,
}

impl ServiceConfig {
    /// Read configuration from the environment.
    ///
    /// Malformed values are errors; absent optional components (registry
    /// credentials, allowlist, database) degrade with startup warnings
    /// instead.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = match std::env::var("NIDG_BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("NIDG_BIND_ADDR {raw:?} is not a socket address"))?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let registry = RegistryConfig::from_env();
        if registry.is_none() {
            tracing::warn!(
                "registry credentials not set — verification routes will answer 503"
            );
        }

        let allowlist = match std::env::var("NIDG_ALLOWED_SYSTEMS") {
            Ok(raw) => Allowlist::parse(&raw).map_err(anyhow::Error::msg)?,
            Err(_) => {
                tracing::warn!("NIDG_ALLOWED_SYSTEMS not set — client allowlist disabled");
                Allowlist::default()
            }
        };

        Ok(Self {
            bind_addr,
            registry,
            allowlist,
        })
    }
}
