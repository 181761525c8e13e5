//! Telegram adapter (teloxide).
//!
//! Implements the `alertgram-core` MessagingPort over the Telegram Bot API and
//! hosts the inbound-update listener.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

pub mod listener;

use alertgram_core::{
    domain::{ChatId, MessageId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, OutgoingMessage, SentMessage, TextMode},
    },
    Result,
};

/// Telegram's hard limit on message text, in UTF-16 code units.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: TELEGRAM_MESSAGE_LIMIT,
        }
    }

    async fn send(&self, msg: OutgoingMessage) -> Result<SentMessage> {
        let OutgoingMessage {
            chat_id,
            text,
            mode,
            disable_link_preview,
        } = msg;

        let mut req = self.bot.send_message(Self::tg_chat(chat_id), text);
        if mode == TextMode::Html {
            req = req.parse_mode(ParseMode::Html);
        }
        if disable_link_preview {
            req = req.disable_web_page_preview(true);
        }

        let sent = req.await.map_err(Self::map_err)?;

        Ok(SentMessage {
            chat_id,
            message_id: MessageId(sent.id.0),
        })
    }
}
