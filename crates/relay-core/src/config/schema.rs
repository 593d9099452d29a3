//! Configuration schema — typed model of the relay's JSON configuration.
//!
//! Hierarchy: `Config` → `ServerConfig`, `RelayConfig` → `[ProviderConfig]`.
//!
//! Every field carries a serde default so a partial file (or none at all)
//! still yields a usable configuration. Field names on disk are snake_case
//! and match the provider-list JSON accepted via `RELAY_PROVIDERS_JSON`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from a JSON file plus env var overrides.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// ─────────────────────────────────────────────
// Relay
// ─────────────────────────────────────────────

/// Dispatch settings: the provider list, send mode, and defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Declarative channel list, in declaration (fallback) order.
    pub providers: Vec<ProviderConfig>,
    /// Send mode: `"pick"` (first success wins) or `"broadcast"` (all).
    /// Anything else falls back to `"pick"`.
    pub mode: String,
    /// Default target address used when an alert carries no override.
    pub default_target: String,
    /// Channels used when an alert has no explicit directive. Empty means
    /// fall back to the mode-dependent policy.
    pub default_channels: Vec<String>,
    /// Upper bound on one alert's whole dispatch, in seconds.
    pub dispatch_timeout_secs: u64,

    // Legacy flat configuration: one URL + one kind, promoted to a single
    // provider named "default" when `providers` is empty.
    pub url: String,
    pub kind: String,
    pub code: String,
    pub api_key: String,
    pub header_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            mode: "pick".to_string(),
            default_target: String::new(),
            default_channels: Vec::new(),
            dispatch_timeout_secs: 30,
            url: String::new(),
            kind: "json".to_string(),
            code: String::new(),
            api_key: String::new(),
            header_key: default_header_key(),
        }
    }
}

impl RelayConfig {
    /// The provider list with the legacy flat configuration folded in.
    ///
    /// When `providers` is non-empty it wins; otherwise a configured legacy
    /// `url` becomes a one-entry list named `"default"`.
    pub fn effective_providers(&self) -> Vec<ProviderConfig> {
        if !self.providers.is_empty() {
            return self.providers.clone();
        }
        if self.url.is_empty() {
            return Vec::new();
        }
        vec![ProviderConfig {
            name: "default".to_string(),
            kind: self.kind.clone(),
            url: self.url.clone(),
            code: self.code.clone(),
            api_key: self.api_key.clone(),
            header_key: self.header_key.clone(),
            ..ProviderConfig::default()
        }]
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Declarative description of one outbound channel.
///
/// Immutable once loaded; the registry turns each entry into a sender.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Unique channel name (later duplicates overwrite earlier entries).
    pub name: String,
    /// Adapter kind; see [`ProviderKind`]. An unknown or empty kind is a
    /// construction error, never silently treated as `json`.
    pub kind: String,
    /// Endpoint URL.
    pub url: String,
    /// HTTP method, default POST.
    pub method: String,
    /// Static code value sent alongside the message (json/form kinds).
    pub code: String,
    /// Payload field names for json/form kinds.
    pub code_field: String,
    pub target_field: String,
    pub content_field: String,
    /// API key placed in `header_key` for header-auth kinds.
    pub api_key: String,
    pub header_key: String,
    /// Webhook signing secret; empty disables signing.
    pub secret: String,
    /// Bearer-token (API) identity.
    pub app_id: String,
    pub app_secret: String,
    /// Default receiver for the API kind; the dispatch target overrides it.
    pub receive_id: String,
    pub receive_id_type: String,
    /// Token endpoint; overridable for self-hosted deployments and tests.
    pub auth_url: String,
    /// Fallback credential lifetime when the provider omits a TTL.
    pub token_ttl_secs: u64,
    /// Static key/value pairs merged into the payload.
    #[serde(rename = "static")]
    pub static_fields: HashMap<String, String>,
    /// Extra headers merged into each request.
    pub headers: HashMap<String, String>,
}

fn default_method() -> String {
    "POST".to_string()
}
fn default_code_field() -> String {
    "code".to_string()
}
fn default_target_field() -> String {
    "target".to_string()
}
fn default_content_field() -> String {
    "content".to_string()
}
fn default_header_key() -> String {
    "X-API-KEY".to_string()
}
fn default_receive_id_type() -> String {
    "chat_id".to_string()
}
fn default_auth_url() -> String {
    "https://open.feishu.cn/open-apis/auth/v3/tenant_access_token/internal".to_string()
}
fn default_token_ttl() -> u64 {
    7200
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            url: String::new(),
            method: default_method(),
            code: String::new(),
            code_field: default_code_field(),
            target_field: default_target_field(),
            content_field: default_content_field(),
            api_key: String::new(),
            header_key: default_header_key(),
            secret: String::new(),
            app_id: String::new(),
            app_secret: String::new(),
            receive_id: String::new(),
            receive_id_type: default_receive_id_type(),
            auth_url: default_auth_url(),
            token_ttl_secs: default_token_ttl(),
            static_fields: HashMap::new(),
            headers: HashMap::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Provider kinds
// ─────────────────────────────────────────────

/// Adapter kinds a provider entry can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    /// Plain JSON body `{code, target, content}`.
    Json,
    /// URL-encoded form body with configurable field names.
    Form,
    /// JSON body plus an API key in a configurable header.
    HeaderJson,
    /// Feishu custom-bot webhook (optionally HMAC-signed).
    FeishuWebhook,
    /// Same wire shape as the Feishu webhook, arbitrary endpoint.
    GenericWebhook,
    /// Feishu open-platform message API, bearer-token authenticated.
    FeishuApi,
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ProviderKind::Json),
            "form" => Ok(ProviderKind::Form),
            "header-json" => Ok(ProviderKind::HeaderJson),
            "feishu-webhook" => Ok(ProviderKind::FeishuWebhook),
            "generic-webhook" => Ok(ProviderKind::GenericWebhook),
            "feishu-api" => Ok(ProviderKind::FeishuApi),
            _ => Err(()),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
