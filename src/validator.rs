//! Dictionary cross-check of surviving candidates.
//!
//! Lookups are memoized per `(word, expected length)` in a [`ValidationCache`]
//! owned by the caller. Inconclusive lookups resolve to "exists" so a flaky
//! dictionary never discards a candidate that may be correct.

use crate::fetch::{AttemptScope, HttpRequest, Transport, TransportError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default dictionary lookup path; the lower-cased word is appended.
pub const DEFAULT_LOOKUP_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

/// Per-lookup time budget.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Memoized existence verdicts. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ValidationCache {
    entries: HashMap<(String, usize), bool>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, word: &str, length: usize) -> Option<bool> {
        self.entries.get(&(word.to_string(), length)).copied()
    }

    pub fn insert(&mut self, word: &str, length: usize, exists: bool) {
        self.entries.insert((word.to_string(), length), exists);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a lookup was decided; useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Cached(bool),
    LengthMismatch,
    Found,
    NotFound,
    /// Lookup failed or returned an unexpected status; treated as found.
    Inconclusive,
}

impl Verdict {
    pub fn exists(self) -> bool {
        match self {
            Verdict::Cached(exists) => exists,
            Verdict::LengthMismatch | Verdict::NotFound => false,
            Verdict::Found | Verdict::Inconclusive => true,
        }
    }
}

/// Per-word existence check against the dictionary service.
#[derive(Clone)]
pub struct ExternalValidator {
    transport: Arc<dyn Transport>,
    lookup_url: String,
    timeout: Duration,
}

impl fmt::Debug for ExternalValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalValidator")
            .field("lookup_url", &self.lookup_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExternalValidator {
    pub fn new(transport: Arc<dyn Transport>, lookup_url: impl Into<String>) -> Self {
        Self {
            transport,
            lookup_url: lookup_url.into(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self, cache: &mut ValidationCache, word: &str, length: usize) -> bool {
        self.check(cache, word, length).exists()
    }

    /// Decide whether `word` exists, consulting and filling `cache`.
    pub fn check(&self, cache: &mut ValidationCache, word: &str, length: usize) -> Verdict {
        if let Some(exists) = cache.get(word, length) {
            return Verdict::Cached(exists);
        }

        let verdict = if word.chars().count() != length {
            Verdict::LengthMismatch
        } else {
            self.lookup(word)
        };

        debug!(word, length, ?verdict, "validated word");
        cache.insert(word, length, verdict.exists());
        verdict
    }

    fn lookup(&self, word: &str) -> Verdict {
        let url = format!("{}{}", self.lookup_url, word.to_lowercase());
        let scope = AttemptScope::new(1, self.timeout);
        let result = self.transport.execute(&HttpRequest::get(&url), &scope);
        if scope.is_cancelled() {
            warn!(word, "dictionary lookup past deadline, keeping word");
            return Verdict::Inconclusive;
        }

        match result {
            Ok(response) if response.status == 200 => Verdict::Found,
            Ok(response) if response.status == 404 => Verdict::NotFound,
            Ok(response) => {
                warn!(
                    word,
                    status = response.status,
                    "inconclusive dictionary lookup, keeping word"
                );
                Verdict::Inconclusive
            }
            Err(TransportError::TimedOut) => {
                warn!(word, "dictionary lookup timed out, keeping word");
                Verdict::Inconclusive
            }
            Err(TransportError::Network(reason)) => {
                warn!(word, %reason, "dictionary lookup failed, keeping word");
                Verdict::Inconclusive
            }
        }
    }
}
