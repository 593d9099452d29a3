//! relay-core — shared foundation for the alert relay.
//!
//! This crate provides:
//! - **config**: typed configuration schema + loader (JSON file, env overrides)
//! - **alert**: inbound payload parsing (free text or JSON → logical alerts)
//! - **error**: the error taxonomy shared by the dispatch pipeline

pub mod alert;
pub mod config;
pub mod error;

pub use alert::ParsedAlert;
pub use config::{Config, ProviderConfig, ProviderKind};
pub use error::{ConfigError, DispatchError, SendError, TokenError};
