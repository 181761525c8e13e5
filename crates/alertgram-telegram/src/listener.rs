//! Inbound update listener.
//!
//! Replies to any text message, or to the bot being added to a group, with the
//! chat's own id so operators can find the number to put in the alert URL.

use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    prelude::*,
    types::{Me, Message, UserId},
};

#[derive(Clone)]
pub struct ListenerState {
    pub me: Me,
    pub debug: bool,
}

pub fn introduction_text(chat_id: i64) -> String {
    format!("Chat id is '{chat_id}'")
}

/// Whether a message should be answered with the chat id.
///
/// Membership events only count when the bot itself joined a group; any
/// non-empty text message counts.
pub fn should_introduce(
    self_id: UserId,
    new_members: &[UserId],
    is_group: bool,
    text: Option<&str>,
) -> bool {
    if !new_members.is_empty() {
        return is_group && new_members.contains(&self_id);
    }
    text.is_some_and(|t| !t.is_empty())
}

/// Run the long-polling dispatcher until the process exits.
///
/// Polling errors are logged by the dispatcher and retried; this only returns
/// on shutdown.
pub async fn run_polling(bot: Bot, state: ListenerState) {
    let state = Arc::new(state);
    let debug = state.debug;

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(move |upd| async move {
            if debug {
                tracing::debug!(update = ?upd, "[UNKNOWN_MESSAGE]");
            }
        })
        .build()
        .dispatch()
        .await;

    tracing::info!("update listener stopped");
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<ListenerState>,
) -> ResponseResult<()> {
    let new_members: Vec<UserId> = msg
        .new_chat_members()
        .map(|users| users.iter().map(|u| u.id).collect())
        .unwrap_or_default();

    if !should_introduce(state.me.id, &new_members, msg.chat.is_group(), msg.text()) {
        return Ok(());
    }

    let text = introduction_text(msg.chat.id.0);
    if let Err(e) = bot.send_message(msg.chat.id, text).await {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to send chat id reply");
    }
    Ok(())
}
