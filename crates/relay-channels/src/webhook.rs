//! Signed webhook sender — Feishu custom-bot wire shape, arbitrary endpoint.
//!
//! Body is `{"msg_type": "text", "content": {"text": ...}}`. When a secret
//! is configured the body additionally carries `timestamp` (Unix seconds at
//! send time) and `sign`.
//!
//! Signature contract:
//! `sign = Base64( HMAC_SHA256( key = secret, message = timestamp + "\n" + secret ) )`
//!
//! A 2xx response whose body carries a numeric `code` / `StatusCode` field
//! other than zero is a provider-level rejection.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::debug;

use relay_core::config::ProviderConfig;
use relay_core::error::{ConfigError, SendError};

use crate::base::Sender;
use crate::http;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type HmacSha256 = Hmac<Sha256>;

/// Webhook sender pushing text messages to a fixed room; the dispatch
/// target is ignored.
pub struct WebhookSender {
    channel_name: String,
    url: String,
    secret: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl WebhookSender {
    /// Build from a provider entry. Requires a non-empty `url`; an empty
    /// `secret` disables signing.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
        http::require(&cfg.name, "url", &cfg.url)?;
        Ok(Self {
            channel_name: cfg.name.clone(),
            url: cfg.url.clone(),
            secret: cfg.secret.clone(),
            headers: http::header_map(&cfg.name, &cfg.headers),
            client: http::client(REQUEST_TIMEOUT),
        })
    }

    fn payload(&self, content: &str, timestamp: i64) -> Value {
        let mut body = json!({
            "msg_type": "text",
            "content": {"text": content},
        });
        if !self.secret.is_empty() {
            let ts = timestamp.to_string();
            body["sign"] = Value::String(sign(&self.secret, &ts));
            body["timestamp"] = Value::String(ts);
        }
        body
    }
}

/// Compute the webhook request signature for one timestamp.
pub fn sign(secret: &str, timestamp: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{timestamp}\n{secret}").as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Extract the provider-level status code from a response body, if any.
fn embedded_code(body: &Value) -> Option<(i64, String)> {
    let code = body
        .get("code")
        .or_else(|| body.get("StatusCode"))
        .and_then(Value::as_i64)?;
    let message = body
        .get("msg")
        .or_else(|| body.get("StatusMessage"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}

#[async_trait]
impl Sender for WebhookSender {
    fn name(&self) -> &str {
        &self.channel_name
    }

    async fn send(&self, _target: &str, content: &str) -> Result<(), SendError> {
        let timestamp = chrono::Utc::now().timestamp();
        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&self.payload(content, timestamp))
            .send()
            .await
            .map_err(http::network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
        }

        // 2xx, but the provider may still report a failure in the body.
        let text = resp.text().await.map_err(http::network)?;
        debug!(channel = %self.channel_name, status = %status, body = %text, "webhook response");

        if let Ok(body) = serde_json::from_str::<Value>(&text) {
            if let Some((code, message)) = embedded_code(&body) {
                if code != 0 {
                    return Err(SendError::ProviderRejected { code, message });
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(url: &str, secret: &str) -> ProviderConfig {
        ProviderConfig {
            name: "feishu-ops".into(),
            kind: "feishu-webhook".into(),
            url: url.into(),
            secret: secret.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_golden_vector() {
        assert_eq!(
            sign("s3cr3t", "1700000000"),
            "APRjwSrmu2gntY/NUIZCw/i74wzW+CEcuSp2qg2XrSQ="
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        assert_eq!(sign("k", "123"), sign("k", "123"));
        assert_ne!(sign("k", "123"), sign("k", "124"));
        assert_ne!(sign("k", "123"), sign("other", "123"));
    }

    #[test]
    fn test_payload_unsigned() {
        let sender = WebhookSender::from_config(&make_config("https://h.example", "")).unwrap();
        let payload = sender.payload("disk full", 1700000000);
        assert_eq!(
            payload,
            json!({"msg_type": "text", "content": {"text": "disk full"}})
        );
    }

    #[test]
    fn test_payload_signed() {
        let sender =
            WebhookSender::from_config(&make_config("https://h.example", "s3cr3t")).unwrap();
        let payload = sender.payload("disk full", 1700000000);
        assert_eq!(payload["timestamp"], "1700000000");
        assert_eq!(payload["sign"], "APRjwSrmu2gntY/NUIZCw/i74wzW+CEcuSp2qg2XrSQ=");
        assert_eq!(payload["content"]["text"], "disk full");
    }

    #[test]
    fn test_embedded_code_variants() {
        assert_eq!(
            embedded_code(&json!({"code": 19001, "msg": "bad sign"})),
            Some((19001, "bad sign".to_string()))
        );
        assert_eq!(
            embedded_code(&json!({"StatusCode": 0, "StatusMessage": "success"})),
            Some((0, "success".to_string()))
        );
        assert_eq!(embedded_code(&json!({"ok": true})), None);
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "msg_type": "text",
                "content": {"text": "disk full"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "msg": "success"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sender =
            WebhookSender::from_config(&make_config(&format!("{}/hook", server.uri()), ""))
                .unwrap();
        sender.send("", "disk full").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_signed_includes_timestamp_and_sign() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let sender = WebhookSender::from_config(&make_config(&server.uri(), "s3cr3t")).unwrap();
        sender.send("", "hello").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let ts = body["timestamp"].as_str().unwrap();
        assert_eq!(body["sign"].as_str().unwrap(), sign("s3cr3t", ts));
    }

    #[tokio::test]
    async fn test_send_provider_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 19021, "msg": "sign match fail"})),
            )
            .mount(&server)
            .await;

        let sender = WebhookSender::from_config(&make_config(&server.uri(), "s")).unwrap();
        let err = sender.send("", "hello").await.unwrap_err();
        match err {
            SendError::ProviderRejected { code, message } => {
                assert_eq!(code, 19021);
                assert_eq!(message, "sign match fail");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_non_json_body_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let sender = WebhookSender::from_config(&make_config(&server.uri(), "")).unwrap();
        sender.send("", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sender = WebhookSender::from_config(&make_config(&server.uri(), "")).unwrap();
        let err = sender.send("", "hello").await.unwrap_err();
        assert!(matches!(err, SendError::HttpStatus(404)));
    }
}
