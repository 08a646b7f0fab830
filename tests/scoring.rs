//! Scoring integration tests
//!
//! Compile real scorefiles from disk and verify evaluation behavior
//! through the public API: combination modes, negation, terminal rules,
//! expiry, nested groups, and the load-failure contract.

use std::fs;
use std::path::PathBuf;

use nntp_score::{OverviewRecord, ScoringEngine, SessionConfig};

fn write_scorefile(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn engine(dir: &tempfile::TempDir, text: &str) -> ScoringEngine {
    let path = write_scorefile(dir, "main.score", text);
    ScoringEngine::new(SessionConfig::new(vec![path]))
}

fn record(subject: &str) -> OverviewRecord {
    let mut rec = OverviewRecord::new(1);
    rec.subject = subject.to_string();
    rec.from = "poster@example.com".to_string();
    rec.message_id = "<1@example.com>".to_string();
    rec
}

/// AND requires every predicate; flipping any single predicate's outcome
/// flips the rule. OR requires at least one; flipping a single predicate
/// only matters at the all-false boundary. Verified exhaustively for 2-4
/// predicate lists.
#[test]
fn and_or_combination_exhaustive() {
    let dir = tempfile::tempdir().unwrap();

    for n in 2..=4usize {
        for mode in ["", ":"] {
            let predicates: String = (0..n)
                .map(|i| format!("Subject: tok{}\n", i))
                .collect();
            let text = format!("[misc.test]\nScore:{} 1\n{}", mode, predicates);
            let mut eng = engine(&dir, &text);
            eng.open_group("misc.test").unwrap();

            for mask in 0u32..(1 << n) {
                let subject: String = (0..n)
                    .filter(|i| mask & (1 << i) != 0)
                    .map(|i| format!("tok{} ", i))
                    .collect();
                let expected = if mode.is_empty() {
                    // AND: all predicates must match
                    mask == (1 << n) - 1
                } else {
                    // OR: at least one
                    mask != 0
                };
                let score = eng.score(&record(&subject), "misc.test");
                assert_eq!(
                    score,
                    i32::from(expected),
                    "n={} mode={:?} mask={:#b}",
                    n,
                    mode,
                    mask
                );
            }
        }
    }
}

#[test]
fn negation_inverts_every_outcome_including_absent() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 1\n\
         ~Subject: spam\n",
    );
    eng.open_group("misc.test").unwrap();

    assert_eq!(eng.score(&record("wholesome content"), "misc.test"), 1);
    assert_eq!(eng.score(&record("buy spam now"), "misc.test"), 0);

    // Absent field: un-negated never matches, negated always does
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 1\n\
         ~X-Whatever: .\n",
    );
    eng.open_group("misc.test").unwrap();
    let mut rec = record("x");
    rec.set_extra("X-Whatever", String::new());
    // Retrieved-but-blank still has a value; "." does not match empty
    assert_eq!(eng.score(&rec, "misc.test"), 1);
}

#[test]
fn terminal_rule_halts_accumulation() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 5\n\
         Subject: .\n\
         Score:= 100\n\
         Subject: jackpot\n\
         Score: 5\n\
         Subject: .\n",
    );
    eng.open_group("misc.test").unwrap();

    // R2 matches: exactly 100 regardless of R1/R3
    assert_eq!(eng.score(&record("jackpot today"), "misc.test"), 100);
    // R2 does not match: R1 and R3 accumulate
    assert_eq!(eng.score(&record("ordinary"), "misc.test"), 10);
}

#[test]
fn non_terminal_rules_accumulate() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 5\n\
         Subject: alpha\n\
         Score: 3\n\
         Subject: beta\n",
    );
    eng.open_group("misc.test").unwrap();

    assert_eq!(eng.score(&record("alpha beta"), "misc.test"), 8);
    assert_eq!(eng.score(&record("alpha only"), "misc.test"), 5);
    assert_eq!(eng.score(&record("neither"), "misc.test"), 0);
}

#[test]
fn expired_rule_excluded_others_active() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 50\n\
         Expires: 01/01/2001\n\
         Subject: .\n\
         Score: 3\n\
         Subject: .\n",
    );
    eng.open_group("misc.test").unwrap();

    assert_eq!(eng.score(&record("anything"), "misc.test"), 3);
}

#[test]
fn generic_header_requested_after_compilation() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: -100\n\
         NNTP-Posting-Host: ^10\\.0\\.\n",
    );
    eng.open_group("misc.test").unwrap();

    assert_eq!(eng.requested_headers(), vec!["NNTP-Posting-Host"]);

    let mut rec = record("x");
    rec.set_extra("NNTP-Posting-Host", "10.0.0.7".to_string());
    assert_eq!(eng.score(&rec, "misc.test"), -100);
}

#[test]
fn nested_and_or_groups() {
    let dir = tempfile::tempdir().unwrap();
    let and_group = "[misc.test]\n\
         Score: 1\n\
         {:\n\
         Subject: alpha\n\
         From: poster\n\
         }\n";
    let or_group = "[misc.test]\n\
         Score: 1\n\
         {::\n\
         Subject: alpha\n\
         From: stranger\n\
         }\n";

    let mut eng = engine(&dir, and_group);
    eng.open_group("misc.test").unwrap();
    assert_eq!(eng.score(&record("alpha"), "misc.test"), 1);
    assert_eq!(eng.score(&record("beta"), "misc.test"), 0);

    let mut eng = engine(&dir, or_group);
    eng.open_group("misc.test").unwrap();
    // From does not match but Subject does
    assert_eq!(eng.score(&record("alpha"), "misc.test"), 1);
    assert_eq!(eng.score(&record("beta"), "misc.test"), 0);
}

#[test]
fn reopening_discards_previous_forest() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[comp.*]\n\
         Score: 10\n\
         Subject: .\n\
         [rec.*]\n\
         Score: -10\n\
         Subject: .\n",
    );

    eng.open_group("comp.lang.rust").unwrap();
    assert_eq!(eng.score(&record("x"), "comp.lang.rust"), 10);

    eng.open_group("rec.games.chess").unwrap();
    assert_eq!(eng.score(&record("x"), "rec.games.chess"), -10);
    // Rules from the prior selector must not leak
    assert_eq!(eng.rule_count(), 1);
}

#[test]
fn malformed_scorefile_leaves_no_rules_active() {
    let dir = tempfile::tempdir().unwrap();

    // Unterminated group block
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 10\n\
         {:\n\
         Subject: x\n",
    );
    assert!(eng.open_group("misc.test").is_err());
    assert_eq!(eng.rule_count(), 0);
    assert_eq!(eng.score(&record("x"), "misc.test"), 0);

    // Predicate line with no colon
    let mut eng = engine(
        &dir,
        "[misc.test]\n\
         Score: 10\n\
         not a predicate\n",
    );
    assert!(eng.open_group("misc.test").is_err());
    assert_eq!(eng.rule_count(), 0);
}

#[test]
fn multiple_scorefiles_load_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_scorefile(&dir, "a.score", "[misc.test]\nScore: 5\nSubject: .\n");
    let second = write_scorefile(&dir, "b.score", "[misc.test]\nScore: 3\nSubject: .\n");

    let mut eng = ScoringEngine::new(SessionConfig::new(vec![first, second]));
    eng.open_group("misc.test").unwrap();
    assert_eq!(eng.rule_count(), 2);
    assert_eq!(eng.score(&record("x"), "misc.test"), 8);
}

#[test]
fn selector_wildcards_and_negation() {
    let dir = tempfile::tempdir().unwrap();
    let mut eng = engine(
        &dir,
        "[comp.lang.*, rec.games.chess]\n\
         Score: 7\n\
         Subject: .\n\
         [~misc.*]\n\
         Score: 2\n\
         Subject: .\n",
    );

    eng.open_group("comp.lang.rust").unwrap();
    // Both selectors apply: the wildcard and the negated misc.* one
    assert_eq!(eng.score(&record("x"), "comp.lang.rust"), 9);

    eng.open_group("misc.forsale").unwrap();
    assert_eq!(eng.score(&record("x"), "misc.forsale"), 0);
}
