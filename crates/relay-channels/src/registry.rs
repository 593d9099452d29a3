//! Provider registry — turns declarative channel configuration into senders.
//!
//! Built once at startup and read-only thereafter. Construction errors are
//! per-entry: the offending channel is recorded and skipped, never aborting
//! the rest of the list. The registry also records declaration order, which
//! drives the deterministic pick-mode fallback sequence.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use relay_core::config::{ProviderConfig, ProviderKind};
use relay_core::error::ConfigError;

use crate::base::Sender;
use crate::feishu_api::FeishuApiSender;
use crate::form::FormSender;
use crate::header_json::HeaderJsonSender;
use crate::json::JsonSender;
use crate::webhook::WebhookSender;

/// Name → sender map plus the declaration order of the names.
pub struct Registry {
    senders: HashMap<String, Arc<dyn Sender>>,
    order: Vec<String>,
}

impl Registry {
    /// Build a registry from a provider list.
    ///
    /// Entries that cannot be constructed are skipped and their errors
    /// returned alongside the registry. When the list produces no senders
    /// at all and a legacy `fallback` sender is supplied, the registry
    /// contains exactly that one entry.
    pub fn build(
        configs: &[ProviderConfig],
        fallback: Option<Arc<dyn Sender>>,
    ) -> (Self, Vec<ConfigError>) {
        let mut registry = Self {
            senders: HashMap::new(),
            order: Vec::new(),
        };
        let mut errors = Vec::new();

        for cfg in configs {
            match build_sender(cfg) {
                Ok(sender) => registry.insert(sender, &mut errors),
                Err(e) => {
                    error!(error = %e, "skipping channel");
                    errors.push(e);
                }
            }
        }

        if registry.senders.is_empty() {
            if let Some(fb) = fallback {
                info!(channel = %fb.name(), "no providers configured, using fallback sender");
                registry.insert(fb, &mut errors);
            }
        }

        (registry, errors)
    }

    /// Build a registry directly from sender instances (the legacy
    /// single-sender path and tests).
    pub fn from_senders(senders: Vec<Arc<dyn Sender>>) -> Self {
        let mut registry = Self {
            senders: HashMap::new(),
            order: Vec::new(),
        };
        let mut errors = Vec::new();
        for sender in senders {
            registry.insert(sender, &mut errors);
        }
        registry
    }

    fn insert(&mut self, sender: Arc<dyn Sender>, errors: &mut Vec<ConfigError>) {
        let name = sender.name().to_string();
        if self.senders.insert(name.clone(), sender).is_some() {
            // The later entry overwrites the earlier one but keeps its
            // original position in the fallback order.
            warn!(channel = %name, "duplicate channel name, overwriting earlier entry");
            errors.push(ConfigError::DuplicateName(name));
        } else {
            self.order.push(name);
        }
    }

    /// Look up a sender by channel name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Sender>> {
        self.senders.get(name)
    }

    /// Whether a channel name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.senders.contains_key(name)
    }

    /// Channel names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether there are no registered channels.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Construct the adapter matching the entry's `kind`.
///
/// An unknown or empty kind is an explicit error — it must never silently
/// fall back to the JSON adapter, which would mask a misconfiguration.
fn build_sender(cfg: &ProviderConfig) -> Result<Arc<dyn Sender>, ConfigError> {
    if cfg.name.is_empty() {
        return Err(ConfigError::MissingField {
            channel: "(unnamed)".to_string(),
            field: "name",
        });
    }

    let kind: ProviderKind = cfg.kind.parse().map_err(|()| ConfigError::UnknownKind {
        channel: cfg.name.clone(),
        kind: cfg.kind.clone(),
    })?;

    let sender: Arc<dyn Sender> = match kind {
        ProviderKind::Json => Arc::new(JsonSender::from_config(cfg)?),
        ProviderKind::Form => Arc::new(FormSender::from_config(cfg)?),
        ProviderKind::HeaderJson => Arc::new(HeaderJsonSender::from_config(cfg)?),
        ProviderKind::FeishuWebhook | ProviderKind::GenericWebhook => {
            Arc::new(WebhookSender::from_config(cfg)?)
        }
        ProviderKind::FeishuApi => Arc::new(FeishuApiSender::from_config(cfg)?),
    };
    Ok(sender)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
