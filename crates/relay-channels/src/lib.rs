//! relay-channels — outbound notification channels.
//!
//! This crate provides:
//! - **base**: the `Sender` trait every channel adapter implements
//! - **registry**: ordered name → sender map built from declarative config
//! - **selector**: the channel-selection policy
//! - **manager**: the dispatch engine (`pick` / `broadcast` send modes)
//! - **token**: cached bearer credential with single-flight refresh
//! - adapters: `json`, `form`, `header_json`, `webhook`, `feishu_api`

pub mod base;
pub mod feishu_api;
pub mod form;
pub mod header_json;
mod http;
pub mod json;
pub mod manager;
pub mod registry;
pub mod selector;
pub mod token;
pub mod webhook;

pub use base::Sender;
pub use manager::{ChannelResult, DispatchResult, Manager, SendMode};
pub use registry::Registry;
