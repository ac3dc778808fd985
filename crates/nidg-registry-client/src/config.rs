//! Registry client configuration.

use zeroize::Zeroizing;

/// Configuration for the identity registry client.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Base URL of the registry API (e.g. `https://registry.example.gov/api/v1`).
    pub base_url: String,
    /// Username for the registry login exchange.
    pub username: String,
    /// Password for the registry login exchange. Zeroized on drop.
    pub password: Zeroizing<String>,
    /// Request timeout in seconds, bounding both registry calls and
    /// photo fetches (default: 30).
    pub timeout_secs: u64,
    /// Assumed bearer token lifetime in seconds (default: 3600).
    ///
    /// The registry does not report an expiry alongside the token. The
    /// cache refreshes once this window closes, and a 401 from the
    /// registry overrides the window at any time.
    pub token_ttl_secs: u64,
    /// Safety margin subtracted from the lifetime so refresh happens
    /// before the token is actually exhausted (default: 60).
    pub token_refresh_margin_secs: u64,
}

impl RegistryConfig {
    /// Create a new configuration with default timeouts and lifetime.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: Zeroizing::new(password.into()),
            timeout_secs: 30,
            token_ttl_secs: 3600,
            token_refresh_margin_secs: 60,
        }
    }

    /// Read the registry configuration from the environment.
    ///
    /// Requires `NIDG_REGISTRY_BASE_URL`, `NIDG_REGISTRY_USERNAME` and
    /// `NIDG_REGISTRY_PASSWORD`; returns `None` when any of them is
    /// absent. `NIDG_REGISTRY_TIMEOUT_SECS` and
    /// `NIDG_REGISTRY_TOKEN_TTL_SECS` override the defaults.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("NIDG_REGISTRY_BASE_URL").ok()?;
        let username = std::env::var("NIDG_REGISTRY_USERNAME").ok()?;
        let password = std::env::var("NIDG_REGISTRY_PASSWORD").ok()?;

        let mut config = Self::new(base_url, username, password);
        if let Some(timeout) = env_u64("NIDG_REGISTRY_TIMEOUT_SECS") {
            config.timeout_secs = timeout;
        }
        if let Some(ttl) = env_u64("NIDG_REGISTRY_TOKEN_TTL_SECS") {
            config.token_ttl_secs = ttl;
        }
        Some(config)
    }
}

/// The password never appears in debug output.
impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .finish()
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring non-numeric environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = RegistryConfig::new("https://registry.example.gov/api/v1", "svc", "s3cret");
        assert_eq!(config.base_url, "https://registry.example.gov/api/v1");
        assert_eq!(config.username, "svc");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.token_refresh_margin_secs, 60);
    }

    #[test]
    fn debug_never_prints_password() {
        let config = RegistryConfig::new("https://registry.example.gov", "svc", "s3cret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
