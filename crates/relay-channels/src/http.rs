//! Shared HTTP plumbing for the sender adapters.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tracing::warn;

use relay_core::error::{ConfigError, SendError};

/// Build a connection-pooled client with a fixed request timeout.
pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build HTTP client")
}

/// Parse the configured HTTP method, defaulting to POST when empty.
pub(crate) fn parse_method(channel: &str, method: &str) -> Result<Method, ConfigError> {
    if method.is_empty() {
        return Ok(Method::POST);
    }
    Method::from_bytes(method.to_uppercase().as_bytes()).map_err(|_| {
        ConfigError::InvalidMethod {
            channel: channel.to_string(),
            method: method.to_string(),
        }
    })
}

/// Turn the configured header map into a `HeaderMap`, skipping (with a
/// warning) entries that are not valid header names/values.
pub(crate) fn header_map(channel: &str, headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(val)) => {
                map.insert(name, val);
            }
            _ => warn!(channel = %channel, header = %key, "skipping invalid header"),
        }
    }
    map
}

/// Require a non-empty configuration field.
pub(crate) fn require(
    channel: &str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingField {
            channel: channel.to_string(),
            field,
        });
    }
    Ok(())
}

/// Map a transport-level failure (connect, TLS, timeout) to `SendError`.
pub(crate) fn network(e: reqwest::Error) -> SendError {
    SendError::Network(e.to_string())
}
