//! Layered settings: optional TOML file overlaid by environment variables.
//!
//! Environment variables use the `WORDLE_SIEVE` prefix and `__` as the
//! section separator, e.g. `WORDLE_SIEVE__TRANSLATOR__API_KEY`.

use crate::collector::{DEFAULT_PAGE_SUFFIX, DEFAULT_URL_TEMPLATE};
use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;
use crate::translate::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::validator::DEFAULT_LOOKUP_URL;
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const ENV_PREFIX: &str = "WORDLE_SIEVE";

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "wordle-sieve";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub translator: TranslatorSettings,
    pub word_source: WordSourceSettings,
    pub dictionary: DictionarySettings,
}

/// Retry overrides shared by the translation and word-source sections.
///
/// Unset keys fall back to the owning section's policy, so a partial table
/// only changes what it names.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl RetrySettings {
    /// Apply the overrides on top of `base`.
    pub fn resolve(&self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map_or(base.initial_backoff, Duration::from_millis),
            attempt_timeout: self
                .timeout_secs
                .map_or(base.attempt_timeout, Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TranslatorSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub retry: RetrySettings,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            retry: RetrySettings::default(),
        }
    }
}

impl TranslatorSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.resolve(RetryPolicy::TRANSLATION)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WordSourceSettings {
    pub url_template: String,
    pub page_suffix: String,
    pub page_delay_ms: u64,
    pub retry: RetrySettings,
}

impl Default for WordSourceSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            page_suffix: DEFAULT_PAGE_SUFFIX.to_string(),
            page_delay_ms: 500,
            retry: RetrySettings::default(),
        }
    }
}

impl WordSourceSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.resolve(RetryPolicy::WORD_SOURCE)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DictionarySettings {
    pub lookup_url: String,
    pub timeout_secs: u64,
    pub delay_ms: u64,
}

impl Default for DictionarySettings {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout_secs: 10,
            delay_ms: 250,
        }
    }
}

impl Settings {
    /// Load settings from `path` (required when given) or from
    /// `wordle-sieve.toml` in the working directory (optional), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                info!("Loading config from {}", p.display());
                File::from(p).required(true)
            }
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(settings)
    }

    /// The translation API key, or a configuration error when it is missing.
    pub fn api_key(&self) -> Result<&str> {
        self.translator
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "translation API key missing; set {}__TRANSLATOR__API_KEY or \
                     translator.api_key",
                    ENV_PREFIX
                ))
            })
    }
}
