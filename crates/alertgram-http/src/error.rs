use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use alertgram_core::messaging::types::SentMessage;

/// Request-scoped failures, rendered as JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid chat id {raw:?}: {source}")]
    BadChatId {
        raw: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid alert payload: {0}")]
    BadPayload(#[source] serde_json::Error),

    #[error(transparent)]
    Render(alertgram_core::Error),

    /// A chunk of a rendered alert was not delivered.
    #[error("{err}")]
    Send { err: String, srcmsg: String },

    /// The ping message was not delivered.
    #[error("{0}")]
    Ping(String),
}

#[derive(Serialize)]
struct ErrBody {
    err: String,
}

#[derive(Serialize)]
struct SendFailureBody {
    err: String,
    message: Option<SentMessage>,
    srcmsg: String,
}

#[derive(Serialize)]
struct PingFailureBody {
    err: String,
    message: Option<SentMessage>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadPayload(_) | ApiError::Ping(_) => StatusCode::BAD_REQUEST,
            ApiError::BadChatId { .. } | ApiError::Render(_) | ApiError::Send { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.to_string();

        match self {
            ApiError::BadChatId { raw, .. } => {
                tracing::warn!(chat_id = %raw, "can't parse chat id");
                (status, Json(ErrBody { err })).into_response()
            }
            ApiError::Send { srcmsg, .. } => (
                status,
                Json(SendFailureBody {
                    err,
                    message: None,
                    srcmsg,
                }),
            )
                .into_response(),
            ApiError::Ping(_) => {
                tracing::warn!(error = %err, "ping failed");
                (status, Json(PingFailureBody { err, message: None })).into_response()
            }
            ApiError::BadPayload(_) | ApiError::Render(_) => {
                tracing::warn!(error = %err, "alert rejected");
                (status, Json(ErrBody { err })).into_response()
            }
        }
    }
}
