//! Rule-language compiler.
//!
//! The rule language is line oriented and case-insensitive. Four line forms
//! are recognized:
//!
//! ```text
//! O AT 3                     exact position (one-based, 1-9)
//! NO S, T, R, E              letters absent from the word
//! A IN WORD, NOT AT 1, 2     letter present, but not at the listed positions
//! LENGTH: 5                  word length
//! ```
//!
//! Each line is tried against [`LINE_RULES`] in order and the first matcher
//! wins. Lines matching nothing are skipped without error.

use crate::DEFAULT_WORD_LENGTH;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Highest one-based position an exact rule may name.
pub const MAX_EXACT_POSITION: usize = 9;

/// A compiled set of letter constraints.
///
/// Positions are zero-based. A `RuleSet` only exists fully compiled; there is
/// no way to mutate one after [`RuleSet::compile`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    exact: BTreeMap<usize, char>,
    present: BTreeMap<char, Vec<usize>>,
    absent: Vec<char>,
    length: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            exact: BTreeMap::new(),
            present: BTreeMap::new(),
            absent: Vec::new(),
            length: DEFAULT_WORD_LENGTH,
        }
    }
}

/// The exact-position constraint used to build the retrieval query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    pub letter: char,
    /// Zero-based position
    pub position: usize,
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.letter, self.position + 1)
    }
}

impl RuleSet {
    /// Compile rule-language text into a `RuleSet`.
    pub fn compile(text: &str) -> Self {
        let mut rules = Self::default();

        for raw in text.lines() {
            let line = raw.trim().to_uppercase();
            if line.is_empty() {
                continue;
            }

            let matched = LINE_RULES.iter().find_map(|rule| {
                rule.pattern.captures(&line).map(|caps| (rule, caps))
            });

            match matched {
                Some((rule, caps)) => {
                    debug!(rule = rule.name, line = %line, "rule line matched");
                    (rule.apply)(&caps, &mut rules);
                }
                None => debug!(line = %line, "ignoring unrecognized rule line"),
            }
        }

        rules
    }

    /// Letters fixed at zero-based positions.
    pub fn exact(&self) -> &BTreeMap<usize, char> {
        &self.exact
    }

    /// Letters that must appear, mapped to the positions they may not occupy.
    pub fn present(&self) -> &BTreeMap<char, Vec<usize>> {
        &self.present
    }

    /// Letters that may not appear anywhere. May contain duplicates.
    pub fn absent(&self) -> &[char] {
        &self.absent
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Pick the exact-position rule with the lowest position, if any.
    pub fn seed(&self) -> Option<Seed> {
        self.exact
            .iter()
            .next()
            .map(|(&position, &letter)| Seed { letter, position })
    }

    /// Render back into canonical rule-language text.
    pub fn to_rule_text(&self) -> String {
        self.to_string()
    }
}

impl FromStr for RuleSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::compile(s))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, letter) in &self.exact {
            writeln!(f, "{} AT {}", letter, position + 1)?;
        }

        for (letter, excluded) in &self.present {
            if excluded.is_empty() {
                writeln!(f, "{} IN WORD", letter)?;
            } else {
                let positions: Vec<String> = excluded.iter().map(|p| (p + 1).to_string()).collect();
                writeln!(f, "{} IN WORD, NOT AT {}", letter, positions.join(", "))?;
            }
        }

        let mut absent: Vec<char> = Vec::with_capacity(self.absent.len());
        for &c in &self.absent {
            if !absent.contains(&c) {
                absent.push(c);
            }
        }
        if !absent.is_empty() {
            let letters: Vec<String> = absent.iter().map(char::to_string).collect();
            writeln!(f, "NO {}", letters.join(", "))?;
        }

        write!(f, "LENGTH: {}", self.length)
    }
}

// --- Line matchers ----------------------------------------------------------

/// One entry in the ordered matcher table.
struct LineRule {
    name: &'static str,
    pattern: &'static Regex,
    apply: fn(&Captures<'_>, &mut RuleSet),
}

/// Matchers in priority order. Lines arrive trimmed and upper-cased.
static LINE_RULES: Lazy<[LineRule; 4]> = Lazy::new(|| {
    [
        LineRule {
            name: "exact",
            pattern: crate::regex!(r"^([A-Z])\s+AT\s+(\d+)$"),
            apply: apply_exact,
        },
        LineRule {
            name: "absent",
            pattern: crate::regex!(r"^NO\s+(.+)$"),
            apply: apply_absent,
        },
        LineRule {
            name: "present",
            pattern: crate::regex!(r"^([A-Z])\s+IN\s+WORD(?:\s*,?\s*NOT\s+AT\s+([\d\s,]*))?$"),
            apply: apply_present,
        },
        LineRule {
            name: "length",
            pattern: crate::regex!(r"^LENGTH\s*:\s*(\d+)$"),
            apply: apply_length,
        },
    ]
});

fn letter(caps: &Captures<'_>, group: usize) -> Option<char> {
    caps.get(group).and_then(|m| m.as_str().chars().next())
}

fn apply_exact(caps: &Captures<'_>, rules: &mut RuleSet) {
    let Some(letter) = letter(caps, 1) else { return };
    let position = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());

    match position {
        Some(p @ 1..=MAX_EXACT_POSITION) => {
            rules.exact.insert(p - 1, letter);
        }
        _ => debug!(%letter, "dropping exact rule with out-of-range position"),
    }
}

fn apply_absent(caps: &Captures<'_>, rules: &mut RuleSet) {
    let Some(list) = caps.get(1) else { return };

    for token in list.as_str().split(',') {
        let mut chars = token.trim().chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                rules.absent.push(c);
            }
        }
    }
}

fn apply_present(caps: &Captures<'_>, rules: &mut RuleSet) {
    let Some(letter) = letter(caps, 1) else { return };

    let excluded: Vec<usize> = caps
        .get(2)
        .map(|m| {
            m.as_str()
                .split(',')
                .filter_map(|d| d.trim().parse::<usize>().ok())
                .filter(|&d| d >= 1)
                .map(|d| d - 1)
                .collect()
        })
        .unwrap_or_default();

    rules.present.insert(letter, excluded);
}

fn apply_length(caps: &Captures<'_>, rules: &mut RuleSet) {
    match caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
        Some(n) if n > 0 => rules.length = n,
        _ => debug!("ignoring non-positive length rule"),
    }
}
