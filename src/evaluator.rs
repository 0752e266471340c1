//! Constraint evaluation of candidate words against a compiled [`RuleSet`].
//!
//! Checks run in a fixed order (length, exact, absent, present) and the first
//! failing check decides the verdict. Because absence is checked before
//! presence, a letter listed in both is always rejected as absent.

use crate::rules::RuleSet;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// Word length differs from the required length
    Length { actual: usize },
    /// Wrong letter at a fixed position
    Exact { position: usize },
    /// Word contains a forbidden letter
    Absent { letter: char },
    /// Word lacks a required letter
    Present { letter: char },
    /// Required letter sits at one of its disallowed positions
    Misplaced { letter: char, position: usize },
}

impl Rejection {
    /// Coarse category name, used for reporting counts.
    pub fn kind(self) -> &'static str {
        match self {
            Rejection::Length { .. } => "length",
            Rejection::Exact { .. } => "exact",
            Rejection::Absent { .. } => "absent",
            Rejection::Present { .. } | Rejection::Misplaced { .. } => "present",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Length { actual } => write!(f, "length {} does not match", actual),
            Rejection::Exact { position } => write!(f, "wrong letter at position {}", position + 1),
            Rejection::Absent { letter } => write!(f, "contains excluded letter {}", letter),
            Rejection::Present { letter } => write!(f, "missing required letter {}", letter),
            Rejection::Misplaced { letter, position } => {
                write!(f, "{} may not be at position {}", letter, position + 1)
            }
        }
    }
}

/// Evaluate a single word. `Ok(())` means the word satisfies every rule.
///
/// The word is upper-cased before comparison; rule letters are always upper
/// case after compilation.
pub fn evaluate(word: &str, rules: &RuleSet) -> Result<(), Rejection> {
    let chars: Vec<char> = word.chars().map(|c| c.to_ascii_uppercase()).collect();

    if chars.len() != rules.length() {
        return Err(Rejection::Length {
            actual: chars.len(),
        });
    }

    for (&position, &required) in rules.exact() {
        if chars.get(position) != Some(&required) {
            return Err(Rejection::Exact { position });
        }
    }

    for &letter in rules.absent() {
        if chars.contains(&letter) {
            return Err(Rejection::Absent { letter });
        }
    }

    for (&letter, excluded) in rules.present() {
        if !chars.contains(&letter) {
            return Err(Rejection::Present { letter });
        }
        for &position in excluded {
            if chars.get(position) == Some(&letter) {
                return Err(Rejection::Misplaced { letter, position });
            }
        }
    }

    Ok(())
}

/// Convenience wrapper around [`evaluate`].
pub fn is_match(word: &str, rules: &RuleSet) -> bool {
    evaluate(word, rules).is_ok()
}

/// Result of filtering a candidate list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Accepted words, in input order
    pub accepted: Vec<String>,
    /// Rejection counts keyed by [`Rejection::kind`]
    pub rejected: BTreeMap<&'static str, usize>,
}

impl FilterOutcome {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Evaluate every candidate in parallel and partition into accepted words and
/// rejection counts.
pub fn filter_candidates<S>(candidates: &[S], rules: &RuleSet) -> FilterOutcome
where
    S: AsRef<str> + Sync,
{
    let verdicts: Vec<Result<(), Rejection>> = candidates
        .par_iter()
        .map(|word| evaluate(word.as_ref(), rules))
        .collect();

    let mut outcome = FilterOutcome::default();
    for (word, verdict) in candidates.iter().zip(verdicts) {
        match verdict {
            Ok(()) => outcome.accepted.push(word.as_ref().to_uppercase()),
            Err(rejection) => *outcome.rejected.entry(rejection.kind()).or_insert(0) += 1,
        }
    }
    outcome
}
