use anyhow::{Context as AnyhowContext, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::net::SocketAddr;

pub(crate) const AUTH_TOKEN_ENV: &str = "CASEDESK_AUTH_TOKEN";

/// Shared secret expected as `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub(crate) struct AuthToken {
    token: String,
}

impl AuthToken {
    /// Flag value first, then the environment. Blank tokens are an error,
    /// not a silent "auth off".
    pub(crate) fn resolve(flag: Option<&str>) -> Result<Option<Self>> {
        let raw = flag
            .map(str::to_string)
            .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok());
        let Some(raw) = raw else {
            return Ok(None);
        };
        let token = raw.trim();
        if token.is_empty() {
            anyhow::bail!("auth token must be non-empty")
        }
        Ok(Some(Self {
            token: token.to_string(),
        }))
    }

    pub(crate) fn admits(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return false;
        };
        let Ok(value) = value.to_str() else {
            return false;
        };
        let Some(presented) = value.trim().strip_prefix("Bearer ") else {
            return false;
        };
        constant_time_eq(presented.trim().as_bytes(), self.token.as_bytes())
    }
}

/// Resolve `bind` and refuse non-loopback addresses unless the operator
/// opted in with `--public` and configured a token.
pub(crate) async fn guarded_bind_addrs(
    bind: &str,
    public: bool,
    token: Option<&AuthToken>,
) -> Result<Vec<SocketAddr>> {
    if public && token.is_none() {
        anyhow::bail!("--public requires an auth token: set --auth-token or export {AUTH_TOKEN_ENV}");
    }

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address resolved to zero socket addrs: {bind}")
    }

    if !public && addrs.iter().any(|addr| !addr.ip().is_loopback()) {
        anyhow::bail!(
            "Refusing to bind to non-loopback address without --public: {bind}. Pass --public and set {AUTH_TOKEN_ENV} (or --auth-token) to expose the dashboard."
        )
    }
    Ok(addrs)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
