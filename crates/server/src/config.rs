use std::{collections::HashMap, fs};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub ledger_url: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            ledger_url: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ledger service URL is not configured; set LEDGER_URL or ledger_url in server.toml")]
    MissingLedgerUrl,
    #[error("ledger service URL '{url}' is invalid: {source}")]
    InvalidLedgerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("ledger service URL '{url}' must use http or https")]
    UnsupportedScheme { url: String },
}

/// Validated address of the external ledger service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub url: Url,
}

impl LedgerConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let raw = settings
            .ledger_url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(ConfigError::MissingLedgerUrl)?;

        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidLedgerUrl {
            url: raw.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                url: raw.to_string(),
            });
        }

        Ok(Self { url })
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string("server.toml").ok();
    load_settings_with(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Layers `server.toml` contents and then environment lookups over the
/// defaults. Prefixed `APP__` variables win over bare ones.
pub fn load_settings_with(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("ledger_url") {
                    settings.ledger_url = Some(v.clone());
                }
                if let Some(v) = file_cfg.get("max_body_bytes") {
                    apply_body_limit(&mut settings, v);
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("LEDGER_URL") {
        settings.ledger_url = Some(v);
    }
    if let Some(v) = env("APP__LEDGER_URL") {
        settings.ledger_url = Some(v);
    }

    if let Some(v) = env("APP__MAX_BODY_BYTES") {
        apply_body_limit(&mut settings, &v);
    }

    settings
}

fn apply_body_limit(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => settings.max_body_bytes = parsed,
        _ => warn!(value = raw, "ignoring invalid max_body_bytes"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
