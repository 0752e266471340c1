//! Error taxonomy for the sieve pipeline.
//!
//! Retryable kinds (rate limiting, timeouts, transport failures) only surface
//! here once the fetcher has run out of attempts. Everything else is terminal
//! on first occurrence.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sieve operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing credential or missing input. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Settings file or environment overrides could not be loaded.
    #[error("failed to load settings: {0}")]
    Settings(#[from] ::config::ConfigError),

    /// The final allowed attempt exceeded its time budget.
    #[error("request to {url} timed out after {attempts} attempt(s) ({timeout:?} per attempt)")]
    Timeout {
        url: String,
        attempts: u32,
        timeout: Duration,
    },

    /// The service kept signalling rate limiting until retries ran out.
    #[error(
        "request to {url} rate limited after {attempts} attempt(s) (status {status}){}",
        format_message(.message)
    )]
    RateLimited {
        url: String,
        attempts: u32,
        status: u16,
        message: Option<String>,
    },

    /// Transport-level failure on the final allowed attempt.
    #[error("network failure for {url} after {attempts} attempt(s): {reason}")]
    Network {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Any other non-success response.
    #[error(
        "request to {url} failed with status {status}{}",
        format_message(.message)
    )]
    Http {
        url: String,
        status: u16,
        message: Option<String>,
    },

    /// The translation response could not be decoded into rule text.
    #[error("could not decode translation response: {0}")]
    Parse(String),
}

impl Error {
    /// Status code of a terminal HTTP failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } | Error::RateLimited { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}
