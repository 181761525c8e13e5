//! Inbound HTTP surface (axum).
//!
//! `POST /alert/:chatid` relays a monitoring payload, `GET /ping/:chatid` sends
//! a test message.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use alertgram_core::{
    delivery::DeliveryCoordinator, messaging::port::MessagingPort, pipeline::AlertPipeline, Result,
};

pub mod error;
pub mod handlers;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AlertPipeline>,
    pub coordinator: DeliveryCoordinator,
    pub messenger: Arc<dyn MessagingPort>,
    /// Log decoded payloads.
    pub debug: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping/:chatid", get(handlers::ping))
        .route("/alert/:chatid", post(handlers::post_alert))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
