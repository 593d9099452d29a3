//! JSON sender — posts `{code, target, content}` to a fixed endpoint.
//!
//! Field names are configurable (`code_field` / `target_field` /
//! `content_field`) and static key/value pairs from the configuration are
//! merged into the payload.

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

/// Sends a flat JSON object to an SMS-gateway style endpoint.
#[derive(Debug)]
pub struct JsonSender {
    channel_name: String,
    url: String,
    method: Method,
    code: String,
    code_field: String,
    target_field: String,
    content_field: String,
    static_fields: HashMap<String, String>,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl JsonSender {
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
impl Sender for JsonSender {
    fn name(&self) -> &str {
        &self.channel_name
    }

    async fn send(&self, target: &str, content: &str) -> Result<(), SendError> {
        let resp = self
            .client
            .request(self.method.clone(), &self.url)
            .headers(self.headers.clone())
            .json(&self.payload(target, content))
            .send()
            .await
            .map_err(http::network)?;

        let status = resp.status();
        debug!(channel = %self.channel_name, status = %status, "json send response");

        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
