use std::{
    env, fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::{errors::Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_LISTEN_ADDR: &str = ":9087";
pub const DEFAULT_SPLIT_CHARS: NonZeroUsize = match NonZeroUsize::new(4000) {
    Some(n) => n,
    None => unreachable!(),
};
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// On-disk YAML shape. Every field is optional here; `Config::from_file`
/// decides what is required.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub telegram_token: Option<String>,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub time_outdata: Option<String>,
    /// Named in bytes for compatibility; applied as a character count.
    #[serde(default)]
    pub split_msg_byte: Option<usize>,
}

/// Command-line values that take precedence over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub template_path: Option<PathBuf>,
    pub debug: bool,
}

/// Validated runtime configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_token: String,
    /// Template file served under the `default` name.
    pub template_path: PathBuf,
    pub time_zone: Tz,
    /// strftime pattern used by the `format_date` template filter.
    pub date_format: String,
    /// Maximum characters per outbound chunk.
    pub split_chars: NonZeroUsize,
    /// Reload templates on every request and log payloads/messages.
    pub debug: bool,
}

impl Config {
    /// Read `path`, apply `.env`/environment and command-line overrides, validate.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self> {
        Self::load_with_env_file(path, Path::new(".env"), overrides)
    }

    /// Like [`Config::load`], reading dotenv entries from `env_file`.
    ///
    /// Variables already set in the environment are left untouched.
    pub fn load_with_env_file(
        path: &Path,
        env_file: &Path,
        overrides: Overrides,
    ) -> Result<Self> {
        load_env_file(env_file);

        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "problem reading configuration file {}: {e}",
                path.display()
            ))
        })?;
        let file: FileConfig = serde_yaml::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "error parsing configuration file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_file(
            file,
            env_str("TELEGRAM_TOKEN").and_then(non_empty),
            overrides,
        )
    }

    /// Validate an already-parsed file.
    pub fn from_file(
        file: FileConfig,
        env_token: Option<String>,
        overrides: Overrides,
    ) -> Result<Self> {
        let telegram_token = env_token
            .or(file.telegram_token)
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config(
                    "telegram_token is required (config file or TELEGRAM_TOKEN)".to_string(),
                )
            })?;

        let template_path = overrides
            .template_path
            .or(file.template_path)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::Config("you must define template path".to_string()))?;

        let zone_name = file
            .time_zone
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("you must define time_zone of your bot".to_string()))?;
        let time_zone = zone_name
            .trim()
            .parse::<Tz>()
            .map_err(|e| Error::Config(format!("invalid time_zone {zone_name:?}: {e}")))?;

        let date_format = file
            .time_outdata
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        let split_chars = file
            .split_msg_byte
            .and_then(NonZeroUsize::new)
            .unwrap_or(DEFAULT_SPLIT_CHARS);

        Ok(Self {
            telegram_token,
            template_path,
            time_zone,
            date_format,
            split_chars,
            debug: overrides.debug,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(e) if e.not_found() => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable env file");
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
