//! Header-auth JSON sender — the JSON wire shape plus an API key header.
//!
//! The key is placed in a configurable header (default `X-API-KEY`); the
//! header is only attached when both the header name and the key are set.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use relay_core::config::ProviderConfig;
use relay_core::error::{ConfigError, SendError};

use crate::base::Sender;
use crate::http;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON sender authenticated by an API key header.
pub struct HeaderJsonSender {
    channel_name: String,
    url: String,
    method: Method,
    code: String,
    code_field: String,
    target_field: String,
    content_field: String,
    api_key: String,
    header_key: String,
    static_fields: HashMap<String, String>,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl HeaderJsonSender {
    /// Build from a provider entry. Requires a non-empty `url`.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
        http::require(&cfg.name, "url", &cfg.url)?;
        Ok(Self {
            channel_name: cfg.name.clone(),
            url: cfg.url.clone(),
            method: http::parse_method(&cfg.name, &cfg.method)?,
            code: cfg.code.clone(),
            code_field: cfg.code_field.clone(),
            target_field: cfg.target_field.clone(),
            content_field: cfg.content_field.clone(),
            api_key: cfg.api_key.clone(),
            header_key: cfg.header_key.clone(),
            static_fields: cfg.static_fields.clone(),
            headers: http::header_map(&cfg.name, &cfg.headers),
            client: http::client(REQUEST_TIMEOUT),
        })
    }

    fn payload(&self, target: &str, content: &str) -> Value {
        let mut body = Map::new();
        body.insert(self.code_field.clone(), Value::String(self.code.clone()));
        body.insert(self.target_field.clone(), Value::String(target.to_string()));
        body.insert(
            self.content_field.clone(),
            Value::String(content.to_string()),
        );
        for (key, value) in &self.static_fields {
            body.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl Sender for HeaderJsonSender {
    fn name(&self) -> &str {
        &self.channel_name
    }

    async fn send(&self, target: &str, content: &str) -> Result<(), SendError> {
        let mut req = self
            .client
            .request(self.method.clone(), &self.url)
            .headers(self.headers.clone())
            .json(&self.payload(target, content));

        if !self.header_key.is_empty() && !self.api_key.is_empty() {
            req = req.header(self.header_key.as_str(), self.api_key.as_str());
        }

        let resp = req.send().await.map_err(http::network)?;

        let status = resp.status();
        debug!(channel = %self.channel_name, status = %status, "header-json send response");

        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
