//! Ordered chunk delivery with per-chunk outcome reporting.

use std::sync::Arc;

use crate::{
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        types::{OutgoingMessage, SentMessage},
    },
};

/// Sent to the chat after a chunk fails.
pub const FAILURE_NOTICE: &str = "Error sending message, checkout logs";

/// Outcome of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    Delivered(SentMessage),
    Failed(String),
}

/// What the triggering caller is told about one chunk, as soon as it is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkResponse {
    Sent(SentMessage),
    Failed {
        chat_id: ChatId,
        err: String,
        /// The whole rendered text, not only the failing chunk.
        srcmsg: String,
    },
}

/// Aggregate result of one delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chat_id: ChatId,
    pub outcomes: Vec<ChunkOutcome>,
}

impl DeliveryReport {
    /// Delivered only if every chunk was.
    pub fn is_delivered(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, ChunkOutcome::Delivered(_)))
    }

    pub fn failed_chunks(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ChunkOutcome::Failed(_)))
            .count()
    }
}

/// Sends chunks to a chat in order and reports every outcome.
#[derive(Clone)]
pub struct DeliveryCoordinator {
    messenger: Arc<dyn MessagingPort>,
    debug: bool,
}

impl DeliveryCoordinator {
    pub fn new(messenger: Arc<dyn MessagingPort>, debug: bool) -> Self {
        Self { messenger, debug }
    }

    /// Send `chunks` to `chat_id`, one send per chunk, strictly in order.
    ///
    /// `on_response` is called once per chunk right after its send returns.
    /// A failed chunk also triggers one best-effort [`FAILURE_NOTICE`]; the
    /// notice's own error is ignored. Failures never stop later chunks.
    pub async fn deliver(
        &self,
        chat_id: ChatId,
        rendered: &str,
        chunks: &[String],
        on_response: &mut (dyn FnMut(ChunkResponse) + Send),
    ) -> DeliveryReport {
        let mut outcomes = Vec::with_capacity(chunks.len());

        for (idx, chunk) in chunks.iter().enumerate() {
            if self.debug {
                tracing::debug!(
                    chat_id = chat_id.0,
                    chunk = idx + 1,
                    of = chunks.len(),
                    "+---------------  F I N A L   M E S S A G E  ---------------+\n{chunk}\n+-----------------------------------------------------------+"
                );
            }

            match self
                .messenger
                .send(OutgoingMessage::alert(chat_id, chunk.as_str()))
                .await
            {
                Ok(sent) => {
                    on_response(ChunkResponse::Sent(sent));
                    outcomes.push(ChunkOutcome::Delivered(sent));
                }
                Err(e) => {
                    let err = e.to_string();
                    tracing::error!(
                        chat_id = chat_id.0,
                        chunk = idx + 1,
                        error = %err,
                        "error sending message"
                    );
                    on_response(ChunkResponse::Failed {
                        chat_id,
                        err: err.clone(),
                        srcmsg: rendered.to_string(),
                    });
                    let _ = self
                        .messenger
                        .send(OutgoingMessage::plain(chat_id, FAILURE_NOTICE))
                        .await;
                    outcomes.push(ChunkOutcome::Failed(err));
                }
            }
        }

        DeliveryReport { chat_id, outcomes }
    }
}
