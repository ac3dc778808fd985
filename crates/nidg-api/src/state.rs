//! Shared application state.

use std::sync::Arc;

use sqlx::MySqlPool;

use nidg_registry_client::RegistryClient;

use crate::audit::AuditSink;
use crate::middleware::allowlist::Allowlist;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry client; `None` when registry credentials are not
    /// configured, in which case verification routes answer 503.
    pub registry: Option<Arc<RegistryClient>>,
    /// Fire-and-forget audit writer.
    pub audit: AuditSink,
    /// Registered client systems. Empty disables the gate.
    pub allowlist: Arc<Allowlist>,
    /// Optional MySQL pool, shared with the audit sink.
    pub db_pool: Option<MySqlPool>,
}

impl AppState {
    /// State with no registry, no database and an open allowlist.
    /// The starting point for bootstrap and for tests.
    pub fn new() -> Self {
        Self {
            registry: None,
            audit: AuditSink::new(None),
            allowlist: Arc::new(Allowlist::default()),
            db_pool: None,
        }
    }

    /// Attach a registry client.
    pub fn with_registry(mut self, registry: RegistryClient) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Attach a client allowlist.
    pub fn with_allowlist(mut self, allowlist: Allowlist) -> Self {
        self.allowlist = Arc::new(allowlist);
        self
    }

    /// Attach a database pool; the audit sink starts persisting.
    pub fn with_db_pool(mut self, pool: MySqlPool) -> Self {
        self.audit = AuditSink::new(Some(pool.clone()));
        self.db_pool = Some(pool);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
