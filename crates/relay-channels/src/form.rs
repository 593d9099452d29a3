//! Form sender — posts a URL-encoded body with configurable field names.
//!
//! The code pair is only included when both the field name and the value are
//! configured; static key/value pairs are appended to the form.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use tracing::debug;

use relay_core::config::ProviderConfig;
use relay_core::error::{ConfigError, SendError};

use crate::base::Sender;
use crate::http;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `application/x-www-form-urlencoded` requests.
pub struct FormSender {
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

impl FormSender {
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

    fn form_pairs(&self, target: &str, content: &str) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.code_field.is_empty() && !self.code.is_empty() {
            pairs.push((self.code_field.clone(), self.code.clone()));
        }
        pairs.push((self.target_field.clone(), target.to_string()));
        pairs.push((self.content_field.clone(), content.to_string()));
        for (key, value) in &self.static_fields {
            pairs.push((key.clone(), value.clone()));
        }
        pairs
    }
}

#[async_trait]
impl Sender for FormSender {
    fn name(&self) -> &str {
        &self.channel_name
    }

    async fn send(&self, target: &str, content: &str) -> Result<(), SendError> {
        let resp = self
            .client
            .request(self.method.clone(), &self.url)
            .headers(self.headers.clone())
            .form(&self.form_pairs(target, content))
            .send()
            .await
            .map_err(http::network)?;

        let status = resp.status();
        debug!(channel = %self.channel_name, status = %status, "form send response");

        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
