use proptest::prelude::*;
use wordle_sieve::{evaluate, filter_candidates, is_match, Rejection, RuleSet};

fn scenario_rules() -> RuleSet {
    RuleSet::compile("O AT 3\nA IN WORD\nNO S, T, R, E\nLENGTH: 5")
}

fn absent(letter: char) -> Result<(), Rejection> {
    Err(Rejection::Absent { letter })
}

fn length(actual: usize) -> Result<(), Rejection> {
    Err(Rejection::Length { actual })
}

#[test]
fn test_word_satisfying_all_rules_passes() {
    assert_eq!(evaluate("CLOAK", &scenario_rules()), Ok(()));
    assert!(is_match("GLOAM", &scenario_rules()));
}

#[test]
fn test_absent_letter_rejects() {
    let rules = scenario_rules();
    assert_eq!(evaluate("STORE", &rules), absent('S'));
    assert_eq!(evaluate("GROAN", &rules), absent('R'));
}

#[test]
fn test_length_checked_first() {
    let rules = scenario_rules();
    assert_eq!(evaluate("CLOAKS", &rules), length(6));
    assert_eq!(evaluate("", &rules), length(0));
}

#[test]
fn test_exact_position_mismatch() {
    let verdict = evaluate("KOALA", &scenario_rules());
    assert_eq!(verdict, Err(Rejection::Exact { position: 2 }));
}

#[test]
fn test_missing_present_letter() {
    let verdict = evaluate("BLOOM", &scenario_rules());
    assert_eq!(verdict, Err(Rejection::Present { letter: 'A' }));
}

#[test]
fn test_excluded_positions_for_present_letter() {
    let rules = RuleSet::compile("A IN WORD, NOT AT 1, 2, 3\nLENGTH: 5");

    assert_eq!(evaluate("TITAN", &rules), Ok(()));
    let misplaced = Rejection::Misplaced {
        letter: 'A',
        position: 2,
    };
    assert_eq!(evaluate("CRANE", &rules), Err(misplaced));
}

#[test]
fn test_absent_and_present_conflict_rejects_as_absent() {
    let rules = RuleSet::compile("A IN WORD\nNO A");
    let present = Rejection::Present { letter: 'A' };
    assert_eq!(evaluate("APPLE", &rules), absent('A'));
    assert_eq!(evaluate("BLIMP", &rules), Err(present));
}

#[test]
fn test_lowercase_words_are_compared_uppercased() {
    assert!(is_match("cloak", &scenario_rules()));
}

#[test]
fn test_custom_length() {
    let rules = RuleSet::compile("P AT 1\nLENGTH: 6");
    assert!(is_match("PLANET", &rules));
    assert!(!is_match("PLANE", &rules));
}

#[test]
fn test_filter_candidates_partitions_and_counts() {
    let words = vec!["CLOAK", "STORE", "GROAN", "KOALA", "BLOOM", "GLOAM", "TOO"];
    let outcome = filter_candidates(&words, &scenario_rules());

    assert_eq!(outcome.accepted, vec!["CLOAK", "GLOAM"]);
    assert_eq!(outcome.rejected.get("absent"), Some(&2));
    assert_eq!(outcome.rejected.get("exact"), Some(&1));
    assert_eq!(outcome.rejected.get("present"), Some(&1));
    assert_eq!(outcome.rejected.get("length"), Some(&1));
    assert_eq!(outcome.rejected_total(), 5);
}

#[test]
fn test_rejection_display() {
    let misplaced = Rejection::Misplaced {
        letter: 'A',
        position: 0,
    };
    let exact = Rejection::Exact { position: 2 };

    assert_eq!(misplaced.to_string(), "A may not be at position 1");
    assert_eq!(exact.to_string(), "wrong letter at position 3");
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(word in "[A-Z]{3,7}", other in "[A-Z]{5}") {
        let rules = scenario_rules();
        let first = evaluate(&word, &rules);
        let _ = evaluate(&other, &rules);
        prop_assert_eq!(first, evaluate(&word, &rules));
    }

    #[test]
    fn letter_in_absent_and_present_never_matches(word in "[A-Z]{5}", letter in "[A-Z]") {
        let rules = RuleSet::compile(&format!("{0} IN WORD\nNO {0}", letter));
        prop_assert!(!is_match(&word, &rules));
    }
}
