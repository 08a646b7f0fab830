//! Compiled scorefile representation
//!
//! A scorefile compiles into a forest: newsgroup selectors at the roots,
//! each carrying the rules that apply when the selector matches the open
//! group, each rule carrying a predicate list that may nest AND/OR groups
//! to arbitrary depth.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::Regex;

/// How a predicate list combines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Every predicate must match (AND); vacuously true when empty
    All,
    /// At least one predicate must match (OR)
    Any,
}

/// Integer-valued overview fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntField {
    /// Body line count
    Lines,
    /// Article size in bytes
    Bytes,
}

/// One compiled predicate node
///
/// Each kind carries only the data it needs; the negation flag inverts the
/// underlying test, including the absent-field case.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Case-insensitive regex search over a string field's current value
    ///
    /// `field` is the header name, or the pseudo-field "Newsgroup" which
    /// matches against the open group's name.
    Pattern {
        /// Header or pseudo-field name
        field: String,
        /// Compiled at load time, case-insensitive
        pattern: Regex,
        /// Invert the match
        negate: bool,
    },
    /// Integer comparison: matches when the article's value exceeds the
    /// threshold
    Threshold {
        /// Which numeric field to test
        field: IntField,
        /// Precomputed threshold
        value: i64,
        /// Invert the match
        negate: bool,
    },
    /// Boolean body-presence test
    HasBody {
        /// Authored 0/1 value
        value: bool,
        /// Invert the match
        negate: bool,
    },
    /// Date cutoff: matches articles older than the cutoff
    ///
    /// The cutoff is fixed at compile time (now minus the authored number
    /// of days) and goes stale until the next reload.
    Age {
        /// Absolute cutoff computed at compile time
        cutoff: DateTime<Utc>,
        /// Invert the match
        negate: bool,
    },
    /// Nested predicate group with its own combination mode
    Group {
        /// AND or OR across the children
        mode: Combine,
        /// Sub-predicate list, authored order
        children: Vec<Predicate>,
        /// Invert the group's result
        negate: bool,
    },
}

impl Predicate {
    /// The node's negation flag
    #[must_use]
    pub fn negated(&self) -> bool {
        match self {
            Predicate::Pattern { negate, .. }
            | Predicate::Threshold { negate, .. }
            | Predicate::HasBody { negate, .. }
            | Predicate::Age { negate, .. }
            | Predicate::Group { negate, .. } => *negate,
        }
    }
}

/// Where a rule came from, for diagnostics
#[derive(Debug, Clone)]
pub struct Provenance {
    /// Scorefile the rule was read from
    pub file: PathBuf,
    /// 1-based line number of the Score: line
    pub line: usize,
    /// Free-text description from the Score: line's trailing comment
    pub description: Option<String>,
}

/// One scored predicate group
#[derive(Debug, Clone)]
pub struct Rule {
    /// Predicates in authored order
    pub predicates: Vec<Predicate>,
    /// AND or OR across the predicate list
    pub mode: Combine,
    /// Score contribution when the rule matches
    pub score: i32,
    /// A match fixes the final score; no further rules are evaluated
    pub terminal: bool,
    /// Source location and description
    pub provenance: Provenance,
    /// Rule's Expires: date has passed; dropped before activation
    pub(crate) expired: bool,
}

/// Newsgroup-name patterns gating a list of rules
#[derive(Debug, Clone)]
pub struct GroupSelector {
    /// Compiled wildmat patterns from the section header
    pub(crate) patterns: Vec<Regex>,
    /// `~` before the pattern list negates the whole selector
    pub(crate) negate: bool,
    /// Rules in file order
    pub rules: Vec<Rule>,
}

impl GroupSelector {
    /// Whether this selector's rules apply to `group`
    #[must_use]
    pub fn matches(&self, group: &str) -> bool {
        let hit = self.patterns.iter().any(|p| p.is_match(group));
        hit != self.negate
    }
}

/// The compiled forest for one load of the scorefile set
#[derive(Debug, Clone, Default)]
pub struct ScoreForest {
    /// Selectors in file order
    pub selectors: Vec<GroupSelector>,
}

impl ScoreForest {
    /// Total number of rules across all selectors
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.selectors.iter().map(|s| s.rules.len()).sum()
    }
}
