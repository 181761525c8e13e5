use std::sync::Arc;

use clap::Parser;
use teloxide::prelude::*;

use alertgram_core::{
    config::{Config, Overrides},
    delivery::DeliveryCoordinator,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    pipeline::AlertPipeline,
    render::{RenderSettings, Renderer},
    templates::{FsTemplateLoader, TemplateStore},
};
use alertgram_http::AppState;
use alertgram_telegram::{
    listener::{self, ListenerState},
    TelegramMessenger,
};

mod cli;

use cli::{normalize_listen_addr, Cli};

#[tokio::main]
async fn main() -> Result<(), alertgram_core::Error> {
    let cli = Cli::parse();
    alertgram_core::logging::init("alertgram", cli.debug)?;

    let cfg = Config::load(
        &cli.config,
        Overrides {
            template_path: cli.template.clone(),
            debug: cli.debug,
        },
    )?;

    let bot = Bot::new(cfg.telegram_token.clone());
    let me = bot
        .get_me()
        .await
        .map_err(|e| alertgram_core::Error::External(format!("telegram login failed: {e}")))?;
    tracing::info!(account = %me.username(), "Authorised on account");

    let store = TemplateStore::new(
        Arc::new(FsTemplateLoader),
        cfg.template_path.clone(),
        cfg.debug,
    )
    .await?;
    if store.reload_enabled() {
        tracing::info!("templates are reloaded on every request");
    }
    let renderer = Renderer::new(RenderSettings {
        time_zone: cfg.time_zone,
        date_format: cfg.date_format.clone(),
    });
    let pipeline = AlertPipeline::new(Arc::new(store), Arc::new(renderer), cfg.split_chars);

    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        Arc::new(TelegramMessenger::new(bot.clone())),
        ThrottleConfig::default(),
    ));
    let limit = messenger.capabilities().max_message_len;
    if cfg.split_chars.get() > limit {
        tracing::warn!(
            split_msg_byte = cfg.split_chars.get(),
            limit,
            "split size exceeds the platform message limit, long alerts may be rejected"
        );
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
        coordinator: DeliveryCoordinator::new(messenger.clone(), cfg.debug),
        messenger,
        debug: cfg.debug,
    };

    let listener_state = ListenerState {
        me,
        debug: cfg.debug,
    };
    tokio::spawn(listener::run_polling(bot, listener_state));

    alertgram_http::serve(&normalize_listen_addr(&cli.listen), state).await
}
