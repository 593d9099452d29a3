//! Token cache — a refreshable bearer credential with expiry.
//!
//! The cache holds at most one credential. `ensure_token` returns it while
//! it is comfortably inside its lifetime and refreshes it otherwise. The
//! mutex is held across the refresh call, so concurrent callers that all
//! observe an expired credential serialize through the lock and exactly one
//! of them performs the network refresh; the rest find a fresh token when
//! they acquire the lock.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use relay_core::error::TokenError;

/// Tokens are never handed out within this margin of their expiry.
const SAFETY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
struct Credential {
    token: String,
    expires_at: Instant,
}

/// Cached tenant credential for a bearer-token provider.
#[derive(Debug)]
pub struct TokenCache {
    client: reqwest::Client,
    auth_url: String,
    app_id: String,
    app_secret: String,
    /// Fallback lifetime when the provider omits a TTL.
    default_ttl: Duration,
    state: Mutex<Option<Credential>>,
}

/// Token endpoint response shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    /// Remaining lifetime in seconds.
    #[serde(default)]
    expire: i64,
}

impl TokenCache {
    pub fn new(
        client: reqwest::Client,
        auth_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            default_ttl,
            state: Mutex::new(None),
        }
    }

    /// Return a token valid for at least the safety margin, refreshing if
    /// needed. A failed refresh leaves any previous credential in place.
    pub async fn ensure_token(&self) -> Result<String, TokenError> {
        let mut guard = self.state.lock().await;

        if let Some(cred) = guard.as_ref() {
            if Instant::now() + SAFETY_MARGIN < cred.expires_at {
                return Ok(cred.token.clone());
            }
            debug!("cached token near expiry, refreshing");
        }

        let cred = self.refresh().await?;
        let token = cred.token.clone();
        *guard = Some(cred);
        Ok(token)
    }

    /// One credential-refresh call against the token endpoint.
    async fn refresh(&self) -> Result<Credential, TokenError> {
        let resp = self
            .client
            .post(&self.auth_url)
            .json(&serde_json::json!({
                "app_id": self.app_id,
                "app_secret": self.app_secret,
            }))
            .send()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TokenError::HttpStatus(status.as_u16()));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if body.code != 0 || body.tenant_access_token.is_empty() {
            return Err(TokenError::Rejected {
                code: body.code,
                message: body.msg,
            });
        }

        let ttl = if body.expire > 0 {
            Duration::from_secs(body.expire as u64)
        } else {
            warn!("token endpoint reported no TTL, using default");
            self.default_ttl
        };
        debug!(ttl_secs = ttl.as_secs(), "refreshed bearer token");

        Ok(Credential {
            token: body.tenant_access_token,
            expires_at: Instant::now() + ttl,
        })
    }

    /// Force the cached credential (if any) to read as expired.
    #[cfg(test)]
    pub(crate) async fn force_expire(&self) {
        if let Some(cred) = self.state.lock().await.as_mut() {
            cred.expires_at = Instant::now();
        }
    }

    /// Current cached token, without triggering a refresh.
    #[cfg(test)]
    pub(crate) async fn cached_token(&self) -> Option<String> {
        self.state.lock().await.as_ref().map(|c| c.token.clone())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
