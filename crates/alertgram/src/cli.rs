//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use alertgram_core::config::{DEFAULT_CONFIG_PATH, DEFAULT_LISTEN_ADDR};

/// Relay monitoring alerts to Telegram chats.
#[derive(Parser, Debug)]
#[command(name = "alertgram")]
#[command(version)]
#[command(about = "Relay monitoring alerts to Telegram chats")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Listen address; `:port` binds every interface.
    #[arg(short = 'l', long = "listen", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Default template file, overrides `template_path`.
    #[arg(short = 't', long = "template")]
    pub template: Option<PathBuf>,

    /// Reload templates per request and log payloads and messages.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

/// Turn `:9087` into a bindable `0.0.0.0:9087`.
pub fn normalize_listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}
