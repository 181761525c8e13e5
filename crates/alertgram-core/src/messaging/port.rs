use async_trait::async_trait;

use crate::{
    messaging::types::{MessagingCapabilities, OutgoingMessage, SentMessage},
    Result,
};

/// Outbound messenger port.
///
/// Telegram is the only implementation; tests plug in recording fakes.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send one message and return the platform acknowledgment.
    async fn send(&self, msg: OutgoingMessage) -> Result<SentMessage>;
}
