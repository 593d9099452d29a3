//! Dispatch manager — orchestrates sends across the registry.
//!
//! In `pick` mode, candidates are attempted one after another in the
//! registry's declaration order and the first success ends the dispatch.
//! In `broadcast` mode every requested candidate is attempted, concurrently,
//! regardless of individual outcomes. Either way the caller gets back one
//! recorded outcome per attempted channel — dispatch failures never cross
//! this boundary as a panic.

use std::fmt;

use futures_util::future::join_all;
use tracing::{error, info, warn};

use relay_core::error::DispatchError;

use crate::registry::Registry;
use crate::selector;

// ─────────────────────────────────────────────
// Send mode
// ─────────────────────────────────────────────

/// How a dispatch treats its candidate list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMode {
    /// Deliver to exactly one channel — the first candidate that succeeds.
    Pick,
    /// Deliver to every requested channel, independent of outcomes.
    Broadcast,
}

impl SendMode {
    /// Parse the configured mode string; anything unrecognized is `pick`.
    pub fn parse(s: &str) -> Self {
        match s {
            "broadcast" => SendMode::Broadcast,
            "pick" | "" => SendMode::Pick,
            other => {
                warn!(mode = %other, "unknown send mode, defaulting to pick");
                SendMode::Pick
            }
        }
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Pick => write!(f, "pick"),
            SendMode::Broadcast => write!(f, "broadcast"),
        }
    }
}

// ─────────────────────────────────────────────
// Dispatch result
// ─────────────────────────────────────────────

/// Outcome of one channel attempt within a dispatch.
#[derive(Debug)]
pub struct ChannelResult {
    pub channel: String,
    pub outcome: Result<(), DispatchError>,
}

/// Aggregated outcome of one dispatch.
#[derive(Debug)]
pub struct DispatchResult {
    pub mode: SendMode,
    pub results: Vec<ChannelResult>,
}

impl DispatchResult {
    /// The active mode's success rule: pick succeeds when any candidate
    /// succeeded; broadcast only when every requested channel did. An empty
    /// candidate set is a failure in both modes.
    pub fn succeeded(&self) -> bool {
        match self.mode {
            SendMode::Pick => self.results.iter().any(|r| r.outcome.is_ok()),
            SendMode::Broadcast => {
                !self.results.is_empty() && self.results.iter().all(|r| r.outcome.is_ok())
            }
        }
    }

    /// First channel that accepted the message, if any.
    pub fn delivered_channel(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| r.outcome.is_ok())
            .map(|r| r.channel.as_str())
    }
}

// ─────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────

/// Owns the registry and dispatch policy for the process lifetime.
pub struct Manager {
    registry: Registry,
    default_target: String,
    mode: SendMode,
    default_channels: Vec<String>,
    /// Channel used by pick mode when nothing selects one explicitly:
    /// the channel named "default" if present, else the first declared.
    primary: Option<String>,
}

impl Manager {
    pub fn new(
        registry: Registry,
        default_target: impl Into<String>,
        mode: SendMode,
        default_channels: Vec<String>,
    ) -> Self {
        let primary = registry
            .names()
            .iter()
            .find(|n| n.as_str() == "default")
            .or_else(|| registry.names().first())
            .cloned();

        info!(
            channels = ?registry.names(),
            mode = %mode,
            "relay manager initialized"
        );

        Self {
            registry,
            default_target: default_target.into(),
            mode,
            default_channels,
            primary,
        }
    }

    pub fn mode(&self) -> SendMode {
        self.mode
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatch to the default channel selection (no explicit directive).
    pub async fn send_default(
        &self,
        content: &str,
        target_override: Option<&str>,
    ) -> DispatchResult {
        self.dispatch(content, None, target_override).await
    }

    /// Dispatch one alert: resolve the channel selection (explicit directive
    /// first, then defaults, then the mode policy) and send.
    pub async fn dispatch(
        &self,
        content: &str,
        explicit: Option<&[String]>,
        target_override: Option<&str>,
    ) -> DispatchResult {
        let names = selector::select(
            explicit,
            &self.default_channels,
            self.mode,
            self.primary.as_deref(),
            self.registry.names(),
        );
        self.send_to(&names, content, target_override).await
    }

    /// Dispatch to the named channels, honoring the active mode.
    pub async fn send_to(
        &self,
        names: &[String],
        content: &str,
        target_override: Option<&str>,
    ) -> DispatchResult {
        let target = match target_override {
            Some(t) if !t.is_empty() => t,
            _ => self.default_target.as_str(),
        };

        let candidates = self.ordered_candidates(names);
        if candidates.is_empty() {
            warn!("no channels to dispatch to");
            return DispatchResult {
                mode: self.mode,
                results: Vec::new(),
            };
        }

        match self.mode {
            SendMode::Pick => self.send_pick(&candidates, target, content).await,
            SendMode::Broadcast => self.send_broadcast(&candidates, target, content).await,
        }
    }

    /// Requested names reordered to registry declaration order, deduplicated;
    /// names absent from the registry keep their requested order at the tail
    /// so their `ChannelNotFound` outcomes still get recorded.
    fn ordered_candidates(&self, names: &[String]) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .registry
            .names()
            .iter()
            .filter(|n| names.contains(n))
            .cloned()
            .collect();
        for name in names {
            if !self.registry.contains(name) && !candidates.contains(name) {
                candidates.push(name.clone());
            }
        }
        candidates
    }

    async fn send_pick(
        &self,
        candidates: &[String],
        target: &str,
        content: &str,
    ) -> DispatchResult {
        let mut results = Vec::new();
        for name in candidates {
            let result = self.attempt(name, target, content).await;
            let delivered = result.outcome.is_ok();
            results.push(result);
            if delivered {
                info!(channel = %name, "alert delivered");
                return DispatchResult {
                    mode: SendMode::Pick,
                    results,
                };
            }
        }
        error!(channels = ?candidates, "all candidate channels failed");
        DispatchResult {
            mode: SendMode::Pick,
            results,
        }
    }

    async fn send_broadcast(
        &self,
        candidates: &[String],
        target: &str,
        content: &str,
    ) -> DispatchResult {
        let attempts = candidates
            .iter()
            .map(|name| self.attempt(name, target, content));
        let results = join_all(attempts).await;

        let failures = results.iter().filter(|r| r.outcome.is_err()).count();
        if failures > 0 {
            warn!(
                failed = failures,
                total = results.len(),
                "broadcast finished with failures"
            );
        }
        DispatchResult {
            mode: SendMode::Broadcast,
            results,
        }
    }

    /// One channel attempt: lookup + send, folded into a recorded outcome.
    async fn attempt(&self, name: &str, target: &str, content: &str) -> ChannelResult {
        let outcome = match self.registry.get(name) {
            None => {
                warn!(channel = %name, "channel not found");
                Err(DispatchError::ChannelNotFound)
            }
            Some(sender) => match sender.send(target, content).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!(channel = %name, error = %e, "send failed");
                    Err(e.into())
                }
            },
        };
        ChannelResult {
            channel: name.to_string(),
            outcome,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
