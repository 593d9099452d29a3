//! Error taxonomy for the relay pipeline.
//!
//! Construction-time problems (`ConfigError`) reduce the available channel
//! set and are logged at startup; dispatch-time problems (`DispatchError`)
//! are collected per channel into the dispatch result and returned to the
//! caller. Nothing in this taxonomy crosses the dispatch boundary as a panic.

use thiserror::Error;

/// A per-send failure reported by a sender adapter.
#[derive(Debug, Error)]
pub enum SendError {
    /// Transport-level failure: connect, TLS, DNS, or request timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered outside the 200–299 range.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// 2xx response whose body carries a provider-level failure code.
    #[error("provider rejected message: code={code} msg={message}")]
    ProviderRejected { code: i64, message: String },

    /// The adapter could not build a valid request from its configuration.
    #[error("invalid send request: {0}")]
    InvalidRequest(String),

    /// Bearer-token refresh failed for a token-auth adapter.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Failure to obtain or refresh a bearer credential.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Transport-level failure reaching the token endpoint.
    #[error("token refresh network error: {0}")]
    Network(String),

    /// The token endpoint answered outside the 200–299 range.
    #[error("token endpoint returned status {0}")]
    HttpStatus(u16),

    /// The token endpoint answered 2xx but refused to issue a credential.
    #[error("token refresh rejected: code={code} msg={message}")]
    Rejected { code: i64, message: String },

    /// The token endpoint answered with a body we could not decode.
    #[error("unparsable token response: {0}")]
    Malformed(String),
}

/// A provider entry that could not be turned into a sender.
///
/// These are recorded during registry construction; the offending entry is
/// skipped and the process continues with the remaining channels.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `kind` field names no known adapter (or is empty).
    #[error("channel {channel:?}: unknown kind {kind:?}")]
    UnknownKind { channel: String, kind: String },

    /// A field the adapter requires is missing or empty.
    #[error("channel {channel:?}: missing required field {field:?}")]
    MissingField { channel: String, field: &'static str },

    /// The `method` field is not a valid HTTP method.
    #[error("channel {channel:?}: invalid HTTP method {method:?}")]
    InvalidMethod { channel: String, method: String },

    /// Two entries share a name; the later one overwrites the earlier.
    #[error("duplicate channel name {0:?}")]
    DuplicateName(String),

    /// The provider list itself could not be decoded.
    #[error("failed to parse provider list: {0}")]
    Parse(String),
}

/// Per-channel outcome inside a dispatch result.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested channel name is not present in the registry.
    #[error("channel not found")]
    ChannelNotFound,

    /// The sender was found but the send itself failed.
    #[error(transparent)]
    Send(#[from] SendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_error_display() {
        let err = SendError::HttpStatus(503);
        assert_eq!(err.to_string(), "unexpected HTTP status 503");

        let err = SendError::ProviderRejected {
            code: 19001,
            message: "invalid receive_id".into(),
        };
        assert!(err.to_string().contains("19001"));
        assert!(err.to_string().contains("invalid receive_id"));
    }

    #[test]
    fn test_token_error_converts_to_send_error() {
        let token_err = TokenError::HttpStatus(401);
        let send_err: SendError = token_err.into();
        assert!(matches!(send_err, SendError::Token(TokenError::HttpStatus(401))));
    }

    #[test]
    fn test_send_error_converts_to_dispatch_error() {
        let err: DispatchError = SendError::Network("connection refused".into()).into();
        assert!(matches!(err, DispatchError::Send(SendError::Network(_))));
    }

    #[test]
    fn test_config_error_names_channel() {
        let err = ConfigError::UnknownKind {
            channel: "ops".into(),
            kind: "carrier-pigeon".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ops"));
        assert!(msg.contains("carrier-pigeon"));
    }
}
