//! Paginated candidate retrieval from the word-source service.
//!
//! Collection for one seed walks a strictly monotonic page chain:
//!
//! ```text
//! Fetching(1) ──page declares next = 2──▶ Fetching(2) ──no next link──▶ Done
//!                 any other next number ──────────────────────────────▶ Done
//! ```
//!
//! Fetching never skips or revisits a page. A 404 on any page after the first
//! ends the chain normally. Any other fatal error after the first page
//! abandons the seed: the collection comes back empty, never partial. A
//! failure on the first page is returned as an error.

use crate::error::Result;
use crate::fetch::{HttpRequest, ResilientFetcher};
use crate::rules::{RuleSet, Seed};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default page-1 URL template. Placeholders: `{length}`, `{letter}`,
/// `{ordinal}` and `{page}` (empty on page 1).
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.bestwordlist.com/{length}letterwordswith{letter}{ordinal}letter{page}.htm";

/// Substituted for `{page}` on pages after the first.
pub const DEFAULT_PAGE_SUFFIX: &str = "page{page}";

/// Politeness delay between consecutive page fetches.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

const ORDINALS: [&str; 5] = ["first", "second", "third", "fourth", "fifth"];

/// Name a zero-based position the way the word source does in its URLs.
pub fn ordinal_name(position: usize) -> String {
    match ORDINALS.get(position) {
        Some(name) => (*name).to_string(),
        None => format!("position{}", position + 1),
    }
}

/// URL scheme of the word-source service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSource {
    url_template: String,
    page_suffix: String,
}

impl Default for WordSource {
    fn default() -> Self {
        Self::new(DEFAULT_URL_TEMPLATE, DEFAULT_PAGE_SUFFIX)
    }
}

impl WordSource {
    pub fn new(url_template: impl Into<String>, page_suffix: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            page_suffix: page_suffix.into(),
        }
    }

    /// Build the URL of `page` (1-based) for a seed and word length.
    pub fn page_url(&self, seed: Seed, length: usize, page: u32) -> String {
        let suffix = if page > 1 {
            self.page_suffix.replace("{page}", &page.to_string())
        } else {
            String::new()
        };

        self.url_template
            .replace("{length}", &length.to_string())
            .replace("{letter}", &seed.letter.to_ascii_lowercase().to_string())
            .replace("{ordinal}", &ordinal_name(seed.position))
            .replace("{page}", &suffix)
    }
}

/// Pagination cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    Fetching(u32),
    Done,
}

impl PageCursor {
    pub fn start() -> Self {
        PageCursor::Fetching(1)
    }

    /// Move past the current page given the page number it declared as next.
    /// Continues only when `declared == current + 1`.
    pub fn advance(self, declared: Option<u32>) -> Self {
        match (self, declared) {
            (PageCursor::Fetching(current), Some(next))
                if current.checked_add(1) == Some(next) =>
            {
                PageCursor::Fetching(next)
            }
            _ => PageCursor::Done,
        }
    }
}

/// What one page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub tokens: Vec<String>,
    pub next_page: Option<u32>,
}

/// Parse a page body into candidate tokens and the declared next page.
pub fn parse_page(body: &str, length: usize) -> Page {
    Page {
        tokens: extract_tokens(body, length),
        next_page: next_page_number(body),
    }
}

/// Extract candidate words of exactly `length` letters.
///
/// Emphasis tags are stripped first so a highlighted letter rejoins its word,
/// then spans flagged invalid are dropped with their contents.
pub fn extract_tokens(body: &str, length: usize) -> Vec<String> {
    let plain =
        crate::regex!(r"(?i)</?(?:b|strong|em|i|u|mark)(?:\s[^>]*)?>").replace_all(body, "");
    let valid = crate::regex!(
        r#"(?is)<span\b[^>]*\bclass\s*=\s*["']?[^"'>]*\b(?:invalid|rd)\b[^>]*>.*?</span>"#
    )
    .replace_all(&plain, " ");

    crate::regex!(r"[A-Z]+")
        .find_iter(&valid)
        .map(|m| m.as_str())
        .filter(|run| run.len() == length)
        .map(str::to_string)
        .collect()
}

/// Find the page number named by a "next page" link, if the page has one.
pub fn next_page_number(body: &str) -> Option<u32> {
    let anchor = crate::regex!(r"(?is)<a\b([^>]*)>(.*?)</a>");
    let rel_next = crate::regex!(r#"(?i)\brel\s*=\s*["']?next\b"#);
    let next_text = crate::regex!(r"(?i)^\s*next\b");
    let href_page = crate::regex!(r#"(?i)\bhref\s*=\s*["']?[^"'\s>]*?page(\d+)"#);

    anchor.captures_iter(body).find_map(|caps| {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let text = caps.get(2).map_or("", |m| m.as_str());
        if !rel_next.is_match(attrs) && !next_text.is_match(text) {
            return None;
        }
        href_page.captures(attrs)?.get(1)?.as_str().parse().ok()
    })
}

/// Why a seed's collection was given up after the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abandoned {
    pub page: u32,
    pub reason: String,
}

/// Candidates gathered for one seed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub words: BTreeSet<String>,
    pub pages: u32,
    /// Set when a later page failed; `words` is then empty.
    pub abandoned: Option<Abandoned>,
}

/// Drives the fetcher across a seed's page chain.
#[derive(Debug, Clone)]
pub struct PaginatedCollector {
    fetcher: ResilientFetcher,
    source: WordSource,
    page_delay: Duration,
}

impl PaginatedCollector {
    pub fn new(fetcher: ResilientFetcher, source: WordSource) -> Self {
        Self {
            fetcher,
            source,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Collect every token on the seed's page chain, deduplicated.
    pub fn collect(&self, rules: &RuleSet, seed: Seed) -> Result<Collection> {
        let length = rules.length();
        let mut collection = Collection::default();
        let mut cursor = PageCursor::start();

        while let PageCursor::Fetching(page) = cursor {
            if page > 1 {
                self.fetcher.pauser().pause(self.page_delay);
            }

            let url = self.source.page_url(seed, length, page);
            let response = match self.fetcher.fetch(&HttpRequest::get(&url)) {
                Ok(response) => response,
                Err(e) if page == 1 => return Err(e),
                Err(e) if e.is_not_found() => {
                    info!(page, "page not found, treating as end of results");
                    cursor = PageCursor::Done;
                    continue;
                }
                Err(e) => {
                    warn!(%seed, page, error = %e, "page failed, abandoning seed");
                    return Ok(Collection {
                        words: BTreeSet::new(),
                        pages: collection.pages,
                        abandoned: Some(Abandoned {
                            page,
                            reason: e.to_string(),
                        }),
                    });
                }
            };

            let parsed = parse_page(&response.body, length);
            debug!(
                page,
                tokens = parsed.tokens.len(),
                next = ?parsed.next_page,
                "parsed page"
            );
            collection.pages += 1;
            collection.words.extend(parsed.tokens);
            cursor = cursor.advance(parsed.next_page);
        }

        info!(
            %seed,
            pages = collection.pages,
            words = collection.words.len(),
            "collection finished"
        );
        Ok(collection)
    }
}
