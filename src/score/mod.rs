//! Scorefile compilation and evaluation
//!
//! [`ScoringEngine`] is the session-owned context object: opening a
//! newsgroup re-reads the configured scorefile set from scratch, activates
//! the selectors matching the group's name, and reports which extra
//! headers the active rules reference so acquisition can fetch them. The
//! previous compiled forest is discarded entirely on every open; a failed
//! load leaves scoring disabled rather than running a half-built forest.

mod compile;
mod eval;
mod rules;
mod wildmat;

pub use compile::ScorefileCompiler;
pub use rules::{Combine, GroupSelector, IntField, Predicate, Provenance, Rule, ScoreForest};

use tracing::debug;

use crate::config::SessionConfig;
use crate::dedup::{IdStatus, MessageIdCache};
use crate::error::Result;
use crate::record::OverviewRecord;

/// Fields with dedicated predicate kinds or record storage; anything else
/// in a pattern predicate is a generic header acquisition must fetch
fn is_standard_field(name: &str) -> bool {
    const STANDARD: [&str; 7] = [
        "Subject",
        "From",
        "Date",
        "Message-ID",
        "References",
        "Xref",
        "Newsgroup",
    ];
    STANDARD.iter().any(|s| s.eq_ignore_ascii_case(name))
}

/// Compiler and evaluator state for one session
///
/// # Lifecycle
///
/// ```text
/// open_group("comp.lang.rust")   compile scorefiles, activate matching rules
/// requested_headers()            feed acquisition the extra headers rules need
/// score(record, group)           once per article, pure and non-blocking
/// close_group()                  discard the forest and header requests
/// ```
#[must_use]
#[derive(Debug)]
pub struct ScoringEngine {
    config: SessionConfig,
    active: Vec<Rule>,
    requested: Vec<String>,
    group: Option<String>,
}

impl ScoringEngine {
    /// Create an engine with no active rules
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            requested: Vec::new(),
            group: None,
        }
    }

    /// Compile the scorefile set and activate the rules for `group`
    ///
    /// Replaces any previously active forest atomically: the old rules are
    /// discarded before compilation, so a failed load disables scoring
    /// until the next successful one.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::Compile`](crate::ScoreError::Compile) (or
    /// [`ScoreError::Io`](crate::ScoreError::Io) for an unreadable
    /// top-level file) and leaves no rules active.
    pub fn open_group(&mut self, group: &str) -> Result<()> {
        self.open_group_with(group, ScorefileCompiler::new())
    }

    /// Like [`open_group`](Self::open_group) with an explicit compiler,
    /// letting callers fix the clock Age/Expires are checked against
    pub fn open_group_with(&mut self, group: &str, compiler: ScorefileCompiler) -> Result<()> {
        self.close_group();
        self.group = Some(group.to_string());

        let forest = compiler.compile(&self.config.score_files)?;

        let mut active = Vec::new();
        for selector in forest.selectors {
            if selector.matches(group) {
                active.extend(selector.rules);
            }
        }
        self.requested = collect_generic_headers(&active);
        debug!(
            "group {}: {} active rule(s), {} extra header(s)",
            group,
            active.len(),
            self.requested.len()
        );
        self.active = active;
        Ok(())
    }

    /// Recompile the scorefile set for the currently open group
    pub fn reload(&mut self) -> Result<()> {
        match self.group.clone() {
            Some(group) => self.open_group(&group),
            None => Ok(()),
        }
    }

    /// Discard the compiled forest and header requests
    pub fn close_group(&mut self) {
        self.active.clear();
        self.requested.clear();
        self.group = None;
    }

    /// Extra header names the active rules reference, in rule order
    pub fn requested_headers(&self) -> Vec<String> {
        self.requested.clone()
    }

    /// Number of rules active for the open group
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.active.len()
    }

    /// Score one record against the active rules
    ///
    /// Matching non-terminal rules accumulate their contributions; a
    /// matching terminal rule fixes the score immediately. Zero is
    /// neutral. Malformed records start from the invalid-header penalty.
    #[must_use]
    pub fn score(&self, record: &OverviewRecord, group: &str) -> i32 {
        debug_assert!(
            !record.has_unresolved_extras(),
            "record reached the evaluator with unresolved headers"
        );

        let mut total = if record.malformed {
            self.config.invalid_header_penalty
        } else {
            0
        };

        for rule in &self.active {
            if eval::rule_matches(rule, record, group) {
                if rule.terminal {
                    return rule.score;
                }
                total += rule.score;
            }
        }
        total
    }

    /// Score one record, consulting a message-id cache first
    ///
    /// An id already seen under a different newsgroup short-circuits to
    /// the kill score.
    #[must_use]
    pub fn score_with_cache(
        &self,
        record: &OverviewRecord,
        group: &str,
        cache: &mut dyn MessageIdCache,
    ) -> i32 {
        if cache.check(&record.message_id, group) == IdStatus::SeenElsewhere {
            return self.config.kill_score;
        }
        self.score(record, group)
    }
}

/// Walk predicates collecting generic header names, authored order, deduped
fn collect_generic_headers(rules: &[Rule]) -> Vec<String> {
    fn walk(predicate: &Predicate, out: &mut Vec<String>) {
        match predicate {
            Predicate::Pattern { field, .. } => {
                if !is_standard_field(field)
                    && !out.iter().any(|n| n.eq_ignore_ascii_case(field))
                {
                    out.push(field.clone());
                }
            }
            Predicate::Group { children, .. } => {
                for child in children {
                    walk(child, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for rule in rules {
        for predicate in &rule.predicates {
            walk(predicate, &mut out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::HashIdCache;
    use std::fs;
    use std::path::PathBuf;

    fn engine_with(text: &str) -> (ScoringEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.score");
        fs::write(&path, text).unwrap();
        let engine = ScoringEngine::new(SessionConfig::new(vec![path]));
        (engine, dir)
    }

    fn record(subject: &str, from: &str) -> OverviewRecord {
        let mut rec = OverviewRecord::new(1);
        rec.subject = subject.to_string();
        rec.from = from.to_string();
        rec.message_id = format!("<{}@test>", subject.len());
        rec
    }

    #[test]
    fn test_accumulation() {
        let (mut engine, _dir) = engine_with(
            "[comp.lang.rust]\n\
             Score: 5\n\
             Subject: rust\n\
             Score: 3\n\
             From: alice\n",
        );
        engine.open_group("comp.lang.rust").unwrap();

        let rec = record("rust 1.93 released", "alice@example.com");
        assert_eq!(engine.score(&rec, "comp.lang.rust"), 8);

        let rec = record("rust 1.93 released", "bob@example.com");
        assert_eq!(engine.score(&rec, "comp.lang.rust"), 5);
    }

    #[test]
    fn test_terminal_rule_fixes_score() {
        let (mut engine, _dir) = engine_with(
            "[a]\n\
             Score: 5\n\
             Subject: .\n\
             Score:= 100\n\
             From: alice\n\
             Score: 5\n\
             Subject: .\n",
        );
        engine.open_group("a").unwrap();

        let rec = record("anything", "alice@example.com");
        assert_eq!(engine.score(&rec, "a"), 100);

        // Terminal rule not matching: both non-terminal rules accumulate
        let rec = record("anything", "bob@example.com");
        assert_eq!(engine.score(&rec, "a"), 10);
    }

    #[test]
    fn test_selector_gating_and_group_switch() {
        let (mut engine, _dir) = engine_with(
            "[comp.*]\n\
             Score: 10\n\
             Subject: .\n\
             [alt.*]\n\
             Score: -10\n\
             Subject: .\n",
        );

        engine.open_group("comp.lang.rust").unwrap();
        let rec = record("x", "y");
        assert_eq!(engine.score(&rec, "comp.lang.rust"), 10);

        // Reopening discards the previous forest entirely
        engine.open_group("alt.flame").unwrap();
        assert_eq!(engine.score(&rec, "alt.flame"), -10);
        assert_eq!(engine.rule_count(), 1);
    }

    #[test]
    fn test_failed_load_disables_scoring() {
        let (mut engine, dir) = engine_with("[a]\nScore: 10\nSubject: .\n");
        engine.open_group("a").unwrap();
        assert_eq!(engine.rule_count(), 1);

        fs::write(dir.path().join("test.score"), "[a]\nScore: 10\nbroken\n").unwrap();
        assert!(engine.reload().is_err());
        assert_eq!(engine.rule_count(), 0);
        assert_eq!(engine.score(&record("x", "y"), "a"), 0);
    }

    #[test]
    fn test_missing_scorefile_is_error() {
        let mut engine =
            ScoringEngine::new(SessionConfig::new(vec![PathBuf::from("/nonexistent.score")]));
        assert!(engine.open_group("a").is_err());
    }

    #[test]
    fn test_generic_header_registration() {
        let (mut engine, _dir) = engine_with(
            "[a]\n\
             Score: -50\n\
             NNTP-Posting-Host: ^10\\.\n\
             {:\n\
             X-Trace: spam\n\
             Subject: x\n\
             }\n",
        );
        engine.open_group("a").unwrap();
        assert_eq!(
            engine.requested_headers(),
            vec!["NNTP-Posting-Host", "X-Trace"]
        );
    }

    #[test]
    fn test_malformed_record_penalty() {
        let (mut engine, _dir) = engine_with("[a]\nScore: 5\nSubject: zzz\n");
        engine.open_group("a").unwrap();

        let mut rec = record("x", "y");
        rec.malformed = true;
        assert_eq!(engine.score(&rec, "a"), -1);
    }

    #[test]
    fn test_crosspost_kill_via_cache() {
        let (mut engine, _dir) = engine_with("[*]\nScore: 5\nSubject: .\n");
        engine.open_group("comp.lang.rust").unwrap();

        let mut cache = HashIdCache::new();
        let rec = record("hello", "alice");
        assert_eq!(
            engine.score_with_cache(&rec, "comp.lang.rust", &mut cache),
            5
        );
        assert_eq!(
            engine.score_with_cache(&rec, "alt.test", &mut cache),
            -9999
        );
    }

    #[test]
    fn test_no_scorefiles_scores_zero() {
        let mut engine = ScoringEngine::new(SessionConfig::default());
        engine.open_group("a").unwrap();
        assert_eq!(engine.score(&record("x", "y"), "a"), 0);
    }
}
