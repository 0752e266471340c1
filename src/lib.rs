//! # Wordle Sieve
//!
//! Narrows a word universe down to Wordle candidates.
//!
//! Free-text clues are translated into a small rule language, compiled into a
//! [`RuleSet`], and used twice: once to pick a seed query for a paginated
//! word-list source, and once to filter what that source returns. Survivors
//! can optionally be cross-checked against a dictionary service.

#[macro_use]
mod macros;

pub mod collector;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod rules;
pub mod translate;
pub mod transport;
pub mod validator;

pub use collector::{Abandoned, Collection, PageCursor, PaginatedCollector, WordSource};
pub use config::Settings;
pub use error::{Error, Result};
pub use evaluator::{evaluate, filter_candidates, is_match, FilterOutcome, Rejection};
pub use fetch::{
    AttemptScope, Disposition, HttpRequest, HttpResponse, Pause, ResilientFetcher, RetryPolicy,
    ThreadPause, Transport, TransportError,
};
pub use pipeline::{Sieve, SieveReport};
pub use rules::{RuleSet, Seed};
pub use translate::Translator;
pub use transport::HttpTransport;
pub use validator::{ExternalValidator, ValidationCache, Verdict};

/// Default word length for Wordle
pub const DEFAULT_WORD_LENGTH: usize = 5;

/// Load a local word list: one word per line, blank lines skipped,
/// upper-cased.
pub fn load_word_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|s| s.to_uppercase())
        .collect()
}
