use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use alertgram_core::{
    delivery::ChunkResponse,
    domain::{ChatId, Payload},
    messaging::types::OutgoingMessage,
};

use crate::{error::ApiError, AppState};

/// Body of the success response for an alert.
pub const SENT_BODY: &str = "telegram msg sent.";

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    /// Template name or path; empty or absent means `default`.
    #[serde(default)]
    pub template: Option<String>,
}

fn parse_chat_id(raw: &str) -> Result<ChatId, ApiError> {
    raw.parse::<ChatId>().map_err(|source| ApiError::BadChatId {
        raw: raw.to_string(),
        source,
    })
}

pub fn ping_text(chat_id: ChatId) -> String {
    format!("Some HTTP triggered notification by alertgram... {chat_id}")
}

pub async fn ping(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let chat_id = parse_chat_id(&raw)?;
    tracing::info!(chat_id = chat_id.0, "bot test");

    let text = ping_text(chat_id);
    state
        .messenger
        .send(OutgoingMessage::plain(chat_id, text.as_str()))
        .await
        .map_err(|e| ApiError::Ping(e.to_string()))?;

    Ok((StatusCode::OK, text).into_response())
}

/// Render the payload and deliver it chunk by chunk.
///
/// The response reflects the first chunk's outcome and is returned as soon as
/// that outcome is known; the remaining chunks keep going in the background.
pub async fn post_alert(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<AlertQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let chat_id = parse_chat_id(&raw)?;
    tracing::info!(chat_id = chat_id.0, template = ?query.template, "bot alert post");

    let payload: Payload = serde_json::from_slice(&body).map_err(ApiError::BadPayload)?;
    if state.debug {
        tracing::debug!(
            "+------------------  A L E R T  J S O N  -------------------+\n{}\n+-----------------------------------------------------------+",
            serde_json::Value::Object(payload.clone())
        );
    }

    let alert = state
        .pipeline
        .prepare(&payload, query.template.as_deref())
        .await
        .map_err(ApiError::Render)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator = state.coordinator.clone();
    tokio::spawn(async move {
        // The receiver is gone once the first response is written.
        let mut forward = |r: ChunkResponse| {
            let _ = tx.send(r);
        };
        let report = coordinator
            .deliver(chat_id, &alert.text, &alert.chunks, &mut forward)
            .await;

        if report.is_delivered() {
            tracing::info!(
                chat_id = chat_id.0,
                template = %alert.template,
                chunks = report.outcomes.len(),
                "alert delivered"
            );
        } else {
            tracing::warn!(
                chat_id = chat_id.0,
                template = %alert.template,
                chunks = report.outcomes.len(),
                failed = report.failed_chunks(),
                "alert partially delivered"
            );
        }
    });

    match rx.recv().await {
        Some(ChunkResponse::Sent(_)) => Ok((StatusCode::OK, SENT_BODY).into_response()),
        Some(ChunkResponse::Failed { err, srcmsg, .. }) => Err(ApiError::Send { err, srcmsg }),
        // Rendered to nothing: there was nothing to send.
        None => Ok(StatusCode::OK.into_response()),
    }
}
