//! Configuration — typed schema + loader.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{Config, ProviderConfig, ProviderKind, RelayConfig, ServerConfig};
