//! End-to-end sieve run.
//!
//! ```text
//! text ─translate─▶ rule text ─compile─▶ RuleSet ─seed─▶ collect pages
//!      ─filter─▶ matches ─(validate)─▶ SieveReport
//! ```
//!
//! Network calls are strictly sequential. Retryable failures are absorbed by
//! the fetcher; anything that reaches this level halts the run. A seed whose
//! retrieval was abandoned after its first page ends the run with an empty
//! report and a diagnostic.

use crate::collector::{PaginatedCollector, WordSource};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::evaluator::filter_candidates;
use crate::fetch::{Pause, ResilientFetcher, Transport};
use crate::rules::{RuleSet, Seed};
use crate::translate::Translator;
use crate::validator::{ExternalValidator, ValidationCache, Verdict};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pause between consecutive dictionary lookups.
pub const DEFAULT_VALIDATION_DELAY: Duration = Duration::from_millis(250);

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SieveReport {
    pub rules: RuleSet,
    pub seed: Option<Seed>,
    /// Words that passed every rule (and validation, when enabled), sorted
    pub matches: Vec<String>,
    /// Distinct tokens retrieved from the word source
    pub collected: usize,
    pub pages: u32,
    /// Candidates rejected by the rules
    pub rejected: usize,
    /// Rejections per check kind
    pub rejections: BTreeMap<&'static str, usize>,
    /// Candidates the dictionary said do not exist
    pub invalid: usize,
    /// Explanation when the run ended without candidates to filter
    pub diagnostic: Option<String>,
}

/// Orchestrates translation, retrieval, filtering and validation.
pub struct Sieve {
    translator: Option<Translator>,
    collector: PaginatedCollector,
    validator: Option<ExternalValidator>,
    pause: Arc<dyn Pause>,
    validation_delay: Duration,
    cache: ValidationCache,
}

impl fmt::Debug for Sieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sieve")
            .field("translator", &self.translator)
            .field("collector", &self.collector)
            .field("validator", &self.validator)
            .field("validation_delay", &self.validation_delay)
            .field("cached_verdicts", &self.cache.len())
            .finish()
    }
}

impl Sieve {
    pub fn new(collector: PaginatedCollector, pause: Arc<dyn Pause>) -> Self {
        Self {
            translator: None,
            collector,
            validator: None,
            pause,
            validation_delay: DEFAULT_VALIDATION_DELAY,
            cache: ValidationCache::new(),
        }
    }

    /// Wire every component from settings over one shared transport.
    pub fn from_settings(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        pause: Arc<dyn Pause>,
        validate: bool,
    ) -> Self {
        let source = &settings.word_source;
        let collector = PaginatedCollector::new(
            ResilientFetcher::new(transport.clone(), pause.clone(), source.retry_policy()),
            WordSource::new(source.url_template.clone(), source.page_suffix.clone()),
        )
        .with_page_delay(Duration::from_millis(source.page_delay_ms));

        let llm = &settings.translator;
        let translator = Translator::new(
            ResilientFetcher::new(transport.clone(), pause.clone(), llm.retry_policy()),
            llm.endpoint.clone(),
            llm.model.clone(),
            llm.api_key.clone().unwrap_or_default(),
        );

        let dictionary = &settings.dictionary;
        let mut sieve = Self::new(collector, pause)
            .with_translator(translator)
            .with_validation_delay(Duration::from_millis(dictionary.delay_ms));
        if validate {
            sieve = sieve.with_validator(
                ExternalValidator::new(transport, dictionary.lookup_url.clone())
                    .with_timeout(Duration::from_secs(dictionary.timeout_secs)),
            );
        }
        sieve
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Enable dictionary validation of matches.
    pub fn with_validator(mut self, validator: ExternalValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_validation_delay(mut self, delay: Duration) -> Self {
        self.validation_delay = delay;
        self
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Full run starting from free text.
    pub fn run(&mut self, text: &str) -> Result<SieveReport> {
        let translator = self.translator.as_ref().ok_or_else(|| {
            Error::Configuration("no translation service configured".to_string())
        })?;
        let rule_text = translator.translate(text)?;
        self.run_rules(&rule_text)
    }

    /// Run starting from rule-language text, skipping translation.
    pub fn run_rules(&mut self, rule_text: &str) -> Result<SieveReport> {
        let rules = RuleSet::compile(rule_text);
        info!(rules = %rules.to_rule_text().replace('\n', "; "), "compiled rules");
        self.run_compiled(rules)
    }

    pub fn run_compiled(&mut self, rules: RuleSet) -> Result<SieveReport> {
        let Some(seed) = rules.seed() else {
            let diagnostic = "no exact-position rule to seed retrieval".to_string();
            warn!("{}", diagnostic);
            return Ok(SieveReport {
                rules,
                diagnostic: Some(diagnostic),
                ..SieveReport::default()
            });
        };
        info!(%seed, length = rules.length(), "collecting candidates");

        let collection = self.collector.collect(&rules, seed)?;
        if let Some(abandoned) = collection.abandoned {
            let diagnostic = format!(
                "retrieval for {} abandoned at page {}: {}",
                seed, abandoned.page, abandoned.reason
            );
            return Ok(SieveReport {
                rules,
                seed: Some(seed),
                pages: collection.pages,
                diagnostic: Some(diagnostic),
                ..SieveReport::default()
            });
        }

        let candidates: Vec<String> = collection.words.into_iter().collect();

        let outcome = filter_candidates(&candidates, &rules);
        let rejected = outcome.rejected_total();
        info!(
            candidates = candidates.len(),
            accepted = outcome.accepted.len(),
            rejected,
            "filtered candidates"
        );

        let (mut matches, invalid) = match self.validator.clone() {
            Some(validator) => self.validate(&validator, outcome.accepted, rules.length()),
            None => (outcome.accepted, 0),
        };
        matches.sort();

        Ok(SieveReport {
            seed: Some(seed),
            matches,
            collected: candidates.len(),
            pages: collection.pages,
            rejected,
            rejections: outcome.rejected,
            invalid,
            diagnostic: None,
            rules,
        })
    }

    fn validate(
        &mut self,
        validator: &ExternalValidator,
        words: Vec<String>,
        length: usize,
    ) -> (Vec<String>, usize) {
        let mut kept = Vec::with_capacity(words.len());
        let mut invalid = 0;
        let mut queried = false;

        for word in words {
            if queried {
                self.pause.pause(self.validation_delay);
            }
            let verdict = validator.check(&mut self.cache, &word, length);
            queried = !matches!(verdict, Verdict::Cached(_) | Verdict::LengthMismatch);

            if verdict.exists() {
                kept.push(word);
            } else {
                invalid += 1;
            }
        }

        info!(kept = kept.len(), invalid, "validated matches");
        (kept, invalid)
    }
}
