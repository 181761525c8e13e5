use serde::Serialize;

use crate::domain::{ChatId, MessageId};

/// How the platform should interpret message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
    Plain,
    Html,
}

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub mode: TextMode,
    pub disable_link_preview: bool,
}

impl OutgoingMessage {
    /// Plain text with link previews left to the platform default.
    pub fn plain(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            mode: TextMode::Plain,
            disable_link_preview: false,
        }
    }

    /// Rendered alert text: HTML markup on, link previews suppressed.
    pub fn alert(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            mode: TextMode::Html,
            disable_link_preview: true,
        }
    }
}

/// Platform acknowledgment of a delivered message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}
