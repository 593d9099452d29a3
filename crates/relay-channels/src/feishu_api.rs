//! Feishu open-platform API sender — bearer-token authenticated messages.
//!
//! Obtains a tenant access token through the [`TokenCache`] and posts one
//! text message per send. The dispatch target overrides the configured
//! `receive_id`; the Feishu API requires `content` to be a JSON-encoded
//! string rather than a nested object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use relay_core::config::ProviderConfig;
use relay_core::error::{ConfigError, SendError};

use crate::base::Sender;
use crate::http;
use crate::token::TokenCache;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default message endpoint when the provider entry omits `url`.
const DEFAULT_API_URL: &str = "https://open.feishu.cn/open-apis/im/v1/messages";

/// Bearer-token API sender.
#[derive(Debug)]
pub struct FeishuApiSender {
    channel_name: String,
    api_url: String,
    receive_id: String,
    receive_id_type: String,
    headers: HeaderMap,
    client: reqwest::Client,
    tokens: TokenCache,
}

impl FeishuApiSender {
    /// Build from a provider entry. Requires `app_id` and `app_secret`.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
        http::require(&cfg.name, "app_id", &cfg.app_id)?;
        http::require(&cfg.name, "app_secret", &cfg.app_secret)?;
        http::require(&cfg.name, "receive_id_type", &cfg.receive_id_type)?;

        let client = http::client(REQUEST_TIMEOUT);
        let tokens = TokenCache::new(
            client.clone(),
            cfg.auth_url.clone(),
            cfg.app_id.clone(),
            cfg.app_secret.clone(),
            Duration::from_secs(cfg.token_ttl_secs),
        );

        Ok(Self {
            channel_name: cfg.name.clone(),
            api_url: if cfg.url.is_empty() {
                DEFAULT_API_URL.to_string()
            } else {
                cfg.url.clone()
            },
            receive_id: cfg.receive_id.clone(),
            receive_id_type: cfg.receive_id_type.clone(),
            headers: http::header_map(&cfg.name, &cfg.headers),
            client,
            tokens,
        })
    }

    #[cfg(test)]
    pub(crate) fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }
}

#[async_trait]
impl Sender for FeishuApiSender {
    fn name(&self) -> &str {
        &self.channel_name
    }

    async fn send(&self, target: &str, content: &str) -> Result<(), SendError> {
        // The dispatch target overrides the configured receiver.
        let receive_id = if target.is_empty() {
            self.receive_id.as_str()
        } else {
            target
        };
        if receive_id.is_empty() {
            return Err(SendError::InvalidRequest(
                "no receive_id configured and no target given".to_string(),
            ));
        }

        let token = self.tokens.ensure_token().await?;

        let url = format!(
            "{}?receive_id_type={}",
            self.api_url, self.receive_id_type
        );
        let body = serde_json::json!({
            "receive_id": receive_id,
            "msg_type": "text",
            // The API expects content as a JSON-encoded string.
            "content": serde_json::json!({"text": content}).to_string(),
        });

        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let status = resp.status();
        debug!(channel = %self.channel_name, status = %status, "api send response");

        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
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
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(server_uri: &str) -> ProviderConfig {
        ProviderConfig {
            name: "feishu-app".into(),
            kind: "feishu-api".into(),
            url: format!("{server_uri}/messages"),
            auth_url: format!("{server_uri}/auth"),
            app_id: "cli_app".into(),
            app_secret: "app_secret".into(),
            receive_id: "oc_room".into(),
            ..Default::default()
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-abc",
                "expire": 7200
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_from_config_requires_identity() {
        let mut cfg = make_config("https://x.example");
        cfg.app_id = String::new();
        let err = FeishuApiSender::from_config(&cfg).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { field: "app_id", .. }
        ));

        let mut cfg = make_config("https://x.example");
        cfg.app_secret = String::new();
        assert!(FeishuApiSender::from_config(&cfg).is_err());
    }

    #[test]
    fn test_default_api_url() {
        let mut cfg = make_config("https://x.example");
        cfg.url = String::new();
        let sender = FeishuApiSender::from_config(&cfg).unwrap();
        assert_eq!(sender.api_url, DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(query_param("receive_id_type", "chat_id"))
            .and(header("authorization", "Bearer t-abc"))
            .and(body_partial_json(serde_json::json!({
                "receive_id": "oc_room",
                "msg_type": "text",
                "content": "{\"text\":\"disk full\"}"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0, "msg": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = FeishuApiSender::from_config(&make_config(&server.uri())).unwrap();
        sender.send("", "disk full").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_target_overrides_receive_id() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "receive_id": "ou_user"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = FeishuApiSender::from_config(&make_config(&server.uri())).unwrap();
        sender.send("ou_user", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_without_receiver_fails() {
        let server = MockServer::start().await;
        let mut cfg = make_config(&server.uri());
        cfg.receive_id = String::new();
        let sender = FeishuApiSender::from_config(&cfg).unwrap();

        let err = sender.send("", "hello").await.unwrap_err();
        assert!(matches!(err, SendError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_send_token_reused_across_sends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "tenant_access_token": "t-abc",
                "expire": 7200
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let sender = FeishuApiSender::from_config(&make_config(&server.uri())).unwrap();
        sender.send("", "one").await.unwrap();
        sender.send("", "two").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_token_refresh_failure_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let sender = FeishuApiSender::from_config(&make_config(&server.uri())).unwrap();
        let err = sender.send("", "hello").await.unwrap_err();
        assert!(matches!(err, SendError::Token(_)));
        // No message request was attempted.
        assert!(server.received_requests().await.unwrap().iter().all(|r| {
            r.url.path() == "/auth"
        }));
    }

    #[tokio::test]
    async fn test_send_http_error_status() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let sender = FeishuApiSender::from_config(&make_config(&server.uri())).unwrap();
        let err = sender.send("", "hello").await.unwrap_err();
        assert!(matches!(err, SendError::HttpStatus(400)));

        // The failed send must not clear the cached token.
        assert_eq!(
            sender.token_cache().cached_token().await.as_deref(),
            Some("t-abc")
        );
    }
}
