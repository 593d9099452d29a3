//! Sender trait — the capability every outbound channel adapter implements.
//!
//! Each adapter (JSON, form, header-auth, signed webhook, token API) knows
//! how to build one request for its wire format and interpret the response.
//! The registry holds `Arc<dyn Sender>` keyed by channel name; the dispatch
//! manager orchestrates sends across them per the active send mode.

use async_trait::async_trait;
use relay_core::error::SendError;

/// Every outbound channel adapter implements this trait.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Unique channel name matching the provider configuration key.
    fn name(&self) -> &str;

    /// Deliver one message to this channel.
    ///
    /// Performs a single network call with a bounded timeout; transport
    /// failures surface as [`SendError::Network`], non-2xx responses as
    /// [`SendError::HttpStatus`], and 2xx responses carrying an embedded
    /// provider failure code as [`SendError::ProviderRejected`].
    async fn send(&self, target: &str, content: &str) -> Result<(), SendError>;
}
