//! Client-system allowlist.
//!
//! The gateway serves a closed set of registered client systems, each
//! known by the source address it calls from. The middleware resolves
//! the caller's IP to a system name before any handler runs and rejects
//! unknown addresses. Health probes are mounted outside this gate.
//!
//! The client IP comes from the first `X-Forwarded-For` hop when present
//! (the gateway sits behind a reverse proxy in production), falling back
//! to the socket peer address.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Registered client systems keyed by source IP.
///
/// An empty allowlist disables the gate: callers pass through tagged as
/// `unregistered`. Deployments enable it via `NIDG_ALLOWED_SYSTEMS`.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    by_ip: HashMap<IpAddr, String>,
}

impl Allowlist {
    /// Parse the comma-separated `name=ip` form used by
    /// `NIDG_ALLOWED_SYSTEMS`, e.g.
    /// `"tax-portal=10.2.0.4,passport-office=10.2.0.9"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut by_ip = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, ip)) = entry.split_once('=') else {
                return Err(format!("malformed allowlist entry {entry:?}, expected name=ip"));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("empty system name in allowlist entry {entry:?}"));
            }
            let ip: IpAddr = ip
                .trim()
                .parse()
                .map_err(|e| format!("bad IP in allowlist entry {entry:?}: {e}"))?;
            by_ip.insert(ip, name.to_string());
        }
        Ok(Self { by_ip })
    }

    /// Whether the gate is disabled.
    pub fn is_empty(&self) -> bool {
        self.by_ip.is_empty()
    }

    /// Resolve a caller IP to its registered system name.
    pub fn resolve(&self, ip: IpAddr) -> Option<&str> {
        self.by_ip.get(&ip).map(String::as_str)
    }
}

/// The resolved caller identity, inserted into request extensions for
/// handlers and the audit record.
#[derive(Debug, Clone)]
pub struct ClientSystem {
    /// Registered system name, or `unregistered` when the gate is off.
    pub name: String,
    /// Caller IP as observed by the gateway.
    pub ip: String,
}

impl ClientSystem {
    /// Identity used when no allowlist is configured or the middleware
    /// did not run (direct router tests).
    pub fn unregistered() -> Self {
        Self {
            name: "unregistered".to_string(),
            ip: "unknown".to_string(),
        }
    }
}

/// Middleware: resolve the caller against the allowlist.
pub async fn allowlist_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);

    let system = if state.allowlist.is_empty() {
        ClientSystem {
            name: "unregistered".to_string(),
            ip: ip.map_or_else(|| "unknown".to_string(), |i| i.to_string()),
        }
    } else {
        let Some(ip) = ip else {
            return Err(AppError::Forbidden(
                "caller address could not be determined".to_string(),
            ));
        };
        let Some(name) = state.allowlist.resolve(ip) else {
            tracing::warn!(%ip, "rejected caller not on the system allowlist");
            return Err(AppError::Forbidden(format!("address {ip} is not registered")));
        };
        ClientSystem {
            name: name.to_string(),
            ip: ip.to_string(),
        }
    };

    request.extensions_mut().insert(system);
    Ok(next.run(request).await)
}

/// Determine the caller IP: first `X-Forwarded-For` hop, then the socket
/// peer address.
fn client_ip(request: &Request) -> Option<IpAddr> {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return Some(ip);
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
}
