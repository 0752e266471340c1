//! Retrying, timeout-bounded request execution.
//!
//! Every call walks the same state machine:
//!
//! ```text
//! Attempting(n) ──success─────────────────────────────▶ Success(payload)
//!      │
//!      ├─rate limited / timed out / transport error──▶ Retryable
//!      │        n < max: pause(backoff), backoff *= 2, Attempting(n + 1)
//!      │        n = max: Fatal (exhausted)
//!      │
//!      └─any other status─────────────────────────────▶ Fatal
//! ```
//!
//! Each attempt runs under its own [`AttemptScope`], a cancellation token
//! carrying the attempt deadline. An attempt whose scope is cancelled by the
//! time the transport returns is a timeout, whatever the transport reported.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

/// HTTP status the services use to signal rate limiting.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: &Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body.to_string()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort extraction of a server-supplied explanation from a JSON
    /// body: `error.message`, `message`, or a string `error` field.
    pub fn server_message(&self) -> Option<String> {
        let json: Value = serde_json::from_str(&self.body).ok()?;
        json.pointer("/error/message")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum TransportError {
    #[error("attempt timed out")]
    TimedOut,
    #[error("{0}")]
    Network(String),
}

/// Cancellation token scoped to a single attempt.
///
/// The token reports cancelled once [`AttemptScope::cancel`] is called or its
/// deadline passes. Transports should bound their own I/O by
/// [`AttemptScope::remaining`], and may cancel the scope to abandon an
/// attempt early. The fetcher reads the token after every attempt.
#[derive(Debug, Clone)]
pub struct AttemptScope {
    attempt: u32,
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
}

impl AttemptScope {
    pub fn new(attempt: u32, timeout: Duration) -> Self {
        Self {
            attempt,
            deadline: Instant::now() + timeout,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Time left before the deadline fires.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) || Instant::now() >= self.deadline
    }
}

/// Executes a single HTTP exchange. No retries happen at this level.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: &HttpRequest,
        scope: &AttemptScope,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// Cooperative delay used for backoff and politeness pauses.
pub trait Pause: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// How a response should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    RateLimited,
    Fatal,
}

impl Disposition {
    /// Default classification: 2xx succeeds, 429 is retried, the rest is fatal.
    pub fn from_status(response: &HttpResponse) -> Self {
        if response.is_success() {
            Disposition::Success
        } else if response.status == STATUS_TOO_MANY_REQUESTS {
            Disposition::RateLimited
        } else {
            Disposition::Fatal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Policy for the translation service: 5 attempts, 1 s initial backoff,
    /// 20 s per attempt.
    pub const TRANSLATION: Self = Self {
        max_attempts: 5,
        initial_backoff: Duration::from_secs(1),
        attempt_timeout: Duration::from_secs(20),
    };

    /// Policy for word-source page fetches.
    pub const WORD_SOURCE: Self = Self {
        max_attempts: 5,
        initial_backoff: Duration::from_secs(1),
        attempt_timeout: Duration::from_secs(15),
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::WORD_SOURCE
    }
}

/// Why an attempt is being retried.
enum Retry {
    RateLimited {
        status: u16,
        message: Option<String>,
    },
    TimedOut,
    Network(String),
}

impl fmt::Display for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retry::RateLimited { status, .. } => write!(f, "rate limited (status {})", status),
            Retry::TimedOut => f.write_str("timed out"),
            Retry::Network(reason) => write!(f, "network failure: {}", reason),
        }
    }
}

/// Retrying executor over a [`Transport`].
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    pause: Arc<dyn Pause>,
    policy: RetryPolicy,
}

impl fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("transport", &"<dyn Transport>")
            .field("policy", &self.policy)
            .finish()
    }
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>, pause: Arc<dyn Pause>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            pause,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The pause used between attempts, shared with callers that need their
    /// own politeness delays.
    pub fn pauser(&self) -> &dyn Pause {
        self.pause.as_ref()
    }

    /// Fetch with the default status classification.
    pub fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.fetch_with(request, Disposition::from_status)
    }

    /// Fetch, classifying each response with `classify`.
    pub fn fetch_with<F>(&self, request: &HttpRequest, classify: F) -> Result<HttpResponse>
    where
        F: Fn(&HttpResponse) -> Disposition,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            let scope = AttemptScope::new(attempt, self.policy.attempt_timeout);
            debug!(url = %request.url, attempt, "sending request");
            let result = self.transport.execute(request, &scope);

            let retry = if scope.is_cancelled() {
                debug!(url = %request.url, attempt, "attempt outlived its scope");
                Retry::TimedOut
            } else {
                match result {
                    Ok(response) => match classify(&response) {
                        Disposition::Success => return Ok(response),
                        Disposition::RateLimited => Retry::RateLimited {
                            status: response.status,
                            message: response.server_message(),
                        },
                        Disposition::Fatal => {
                            return Err(Error::Http {
                                url: request.url.clone(),
                                status: response.status,
                                message: response.server_message(),
                            })
                        }
                    },
                    Err(TransportError::TimedOut) => Retry::TimedOut,
                    Err(TransportError::Network(reason)) => Retry::Network(reason),
                }
            };

            if attempt >= max_attempts {
                return Err(self.exhausted(request, attempt, retry));
            }

            let delay_ms = backoff.as_millis() as u64;
            warn!(
                url = %request.url,
                attempt,
                max_attempts,
                delay_ms,
                "{}, retrying",
                retry
            );
            self.pause.pause(backoff);
            backoff = backoff.saturating_mul(2);
            attempt += 1;
        }
    }

    fn exhausted(&self, request: &HttpRequest, attempts: u32, retry: Retry) -> Error {
        let url = request.url.clone();
        match retry {
            Retry::RateLimited { status, message } => Error::RateLimited {
                url,
                attempts,
                status,
                message,
            },
            Retry::TimedOut => Error::Timeout {
                url,
                attempts,
                timeout: self.policy.attempt_timeout,
            },
            Retry::Network(reason) => Error::Network {
                url,
                attempts,
                reason,
            },
        }
    }
}
