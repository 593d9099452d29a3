//! Config loader — reads a JSON file and merges env var overrides.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file, when a path is given
//! 3. Environment variables `RELAY_<SECTION>__<FIELD>` (override JSON)
//!
//! A missing or malformed file degrades to defaults with a warning; config
//! problems never abort the process.

use std::path::Path;
use tracing::{debug, error, info, warn};

use super::schema::{Config, ProviderConfig};
use crate::alert::split_list;

/// Load configuration from an optional file path + env vars.
pub fn load_config(path: Option<&Path>) -> Config {
    let config = match path {
        Some(p) => load_config_from_path(p),
        None => {
            debug!("no config file given, starting from defaults");
            Config::default()
        }
    };
    apply_env_overrides(config)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("no config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `RELAY_<SECTION>__<FIELD>` (double underscore as
/// delimiter), plus the flat legacy variables kept for single-sender
/// deployments:
///
/// - `RELAY_SERVER__HOST` / `RELAY_SERVER__PORT`
/// - `RELAY_MODE`, `RELAY_DEFAULT_TARGET`, `RELAY_DEFAULT_CHANNELS`
/// - `RELAY_DISPATCH_TIMEOUT_SECS`
/// - `RELAY_PROVIDERS_JSON` — inline JSON provider list
/// - `RELAY_URL`, `RELAY_KIND`, `RELAY_CODE`, `RELAY_API_KEY`,
///   `RELAY_HEADER_KEY` — legacy flat single-provider config
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("RELAY_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("RELAY_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }

    if let Ok(val) = std::env::var("RELAY_MODE") {
        config.relay.mode = val;
    }
    if let Ok(val) = std::env::var("RELAY_DEFAULT_TARGET") {
        config.relay.default_target = val;
    }
    if let Ok(val) = std::env::var("RELAY_DEFAULT_CHANNELS") {
        config.relay.default_channels = split_list(&val);
    }
    if let Ok(val) = std::env::var("RELAY_DISPATCH_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse::<u64>() {
            config.relay.dispatch_timeout_secs = secs;
        }
    }

    if let Ok(val) = std::env::var("RELAY_PROVIDERS_JSON") {
        match serde_json::from_str::<Vec<ProviderConfig>>(&val) {
            Ok(providers) => config.relay.providers = providers,
            // Keep whatever the file configured; a bad inline list is
            // logged, not fatal.
            Err(e) => error!("failed to parse RELAY_PROVIDERS_JSON: {}", e),
        }
    }

    // Legacy flat single-provider config
    if let Ok(val) = std::env::var("RELAY_URL") {
        config.relay.url = val;
    }
    if let Ok(val) = std::env::var("RELAY_KIND") {
        config.relay.kind = val;
    }
    if let Ok(val) = std::env::var("RELAY_CODE") {
        config.relay.code = val;
    }
    if let Ok(val) = std::env::var("RELAY_API_KEY") {
        config.relay.api_key = val;
    }
    if let Ok(val) = std::env::var("RELAY_HEADER_KEY") {
        config.relay.header_key = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
