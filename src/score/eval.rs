//! Score evaluation
//!
//! Pure, non-blocking walk of the active rule list against one overview
//! record. Safe to call in the per-article hot loop; every header a
//! predicate references must already be resolved by acquisition.

use chrono::{DateTime, Utc};

use crate::record::OverviewRecord;
use crate::score::rules::{Combine, IntField, Predicate, Rule};

/// Evaluate one rule against a record
///
/// AND mode short-circuits to "no match" on the first failing predicate;
/// OR mode short-circuits to "match" on the first success. An empty
/// AND list matches every article (the unconditional-score idiom); an
/// empty OR list matches none.
pub(crate) fn rule_matches(rule: &Rule, record: &OverviewRecord, group: &str) -> bool {
    combine_matches(&rule.predicates, rule.mode, record, group)
}

fn combine_matches(
    predicates: &[Predicate],
    mode: Combine,
    record: &OverviewRecord,
    group: &str,
) -> bool {
    match mode {
        Combine::All => predicates.iter().all(|p| predicate_matches(p, record, group)),
        Combine::Any => predicates.iter().any(|p| predicate_matches(p, record, group)),
    }
}

/// Test one predicate, applying its negation flag
///
/// An absent field value is an automatic non-match, which negation turns
/// into a match.
pub(crate) fn predicate_matches(
    predicate: &Predicate,
    record: &OverviewRecord,
    group: &str,
) -> bool {
    let hit = match predicate {
        Predicate::Pattern { field, pattern, .. } => {
            let value = if field.eq_ignore_ascii_case("Newsgroup") {
                Some(group)
            } else {
                record.field(field)
            };
            match value {
                Some(value) => pattern.is_match(value),
                None => false,
            }
        }
        Predicate::Threshold { field, value, .. } => {
            let actual = match field {
                IntField::Lines => record.lines as i64,
                IntField::Bytes => record.bytes as i64,
            };
            actual > *value
        }
        Predicate::HasBody { value, .. } => record.has_body == *value,
        Predicate::Age { cutoff, .. } => match parse_article_date(&record.date) {
            Some(date) => date < *cutoff,
            None => false,
        },
        Predicate::Group { mode, children, .. } => {
            combine_matches(children, *mode, record, group)
        }
    };
    hit != predicate.negated()
}

/// Parse an article Date header for age comparison
///
/// RFC 2822/5322 format, tolerating a trailing comment like "(UTC)".
fn parse_article_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(date.with_timezone(&Utc));
    }
    let without_comment = match trimmed.rfind('(') {
        Some(idx) => trimmed[..idx].trim_end(),
        None => return None,
    };
    DateTime::parse_from_rfc2822(without_comment)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use regex::RegexBuilder;
    use std::path::PathBuf;

    use crate::score::rules::Provenance;

    fn pattern(field: &str, source: &str, negate: bool) -> Predicate {
        Predicate::Pattern {
            field: field.to_string(),
            pattern: RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .unwrap(),
            negate,
        }
    }

    fn rule(predicates: Vec<Predicate>, mode: Combine) -> Rule {
        Rule {
            predicates,
            mode,
            score: 1,
            terminal: false,
            provenance: Provenance {
                file: PathBuf::from("test.score"),
                line: 1,
                description: None,
            },
            expired: false,
        }
    }

    fn record() -> OverviewRecord {
        let mut rec = OverviewRecord::new(1);
        rec.subject = "Announcing nntp-score 0.1".to_string();
        rec.from = "alice@example.com".to_string();
        rec.lines = 120;
        rec.bytes = 4096;
        rec
    }

    #[test]
    fn test_pattern_match_and_negate() {
        let rec = record();
        assert!(predicate_matches(&pattern("Subject", "announcing", false), &rec, "g"));
        assert!(!predicate_matches(&pattern("Subject", "announcing", true), &rec, "g"));
        assert!(!predicate_matches(&pattern("Subject", "zebra", false), &rec, "g"));
        assert!(predicate_matches(&pattern("Subject", "zebra", true), &rec, "g"));
    }

    #[test]
    fn test_absent_field_is_non_match_unless_negated() {
        let mut rec = record();
        rec.request_extra("X-Trace");

        assert!(!predicate_matches(&pattern("X-Trace", ".", false), &rec, "g"));
        assert!(predicate_matches(&pattern("X-Trace", ".", true), &rec, "g"));
    }

    #[test]
    fn test_newsgroup_pseudo_field() {
        let rec = record();
        let p = pattern("Newsgroup", "^comp\\.", false);
        assert!(predicate_matches(&p, &rec, "comp.lang.rust"));
        assert!(!predicate_matches(&p, &rec, "alt.test"));
    }

    #[test]
    fn test_threshold_exceeds() {
        let rec = record();
        let over = Predicate::Threshold {
            field: IntField::Lines,
            value: 100,
            negate: false,
        };
        let under = Predicate::Threshold {
            field: IntField::Lines,
            value: 500,
            negate: false,
        };
        assert!(predicate_matches(&over, &rec, "g"));
        assert!(!predicate_matches(&under, &rec, "g"));
    }

    #[test]
    fn test_has_body() {
        let mut rec = record();
        let wants_body = Predicate::HasBody {
            value: true,
            negate: false,
        };
        assert!(predicate_matches(&wants_body, &rec, "g"));
        rec.has_body = false;
        assert!(!predicate_matches(&wants_body, &rec, "g"));
    }

    #[test]
    fn test_age_cutoff() {
        let mut rec = record();
        rec.date = "Mon, 01 Jan 2001 10:00:00 +0000".to_string();

        let old = Predicate::Age {
            cutoff: Utc::now() - Duration::days(30),
            negate: false,
        };
        assert!(predicate_matches(&old, &rec, "g"));

        // Unparsable date never matches un-negated
        rec.date = "not a date".to_string();
        assert!(!predicate_matches(&old, &rec, "g"));
    }

    #[test]
    fn test_and_rule_short_circuit_semantics() {
        let rec = record();
        let both = rule(
            vec![
                pattern("Subject", "announcing", false),
                pattern("From", "alice", false),
            ],
            Combine::All,
        );
        assert!(rule_matches(&both, &rec, "g"));

        let one_fails = rule(
            vec![
                pattern("Subject", "announcing", false),
                pattern("From", "bob", false),
            ],
            Combine::All,
        );
        assert!(!rule_matches(&one_fails, &rec, "g"));
    }

    #[test]
    fn test_or_rule() {
        let rec = record();
        let either = rule(
            vec![
                pattern("Subject", "zebra", false),
                pattern("From", "alice", false),
            ],
            Combine::Any,
        );
        assert!(rule_matches(&either, &rec, "g"));

        let neither = rule(
            vec![
                pattern("Subject", "zebra", false),
                pattern("From", "bob", false),
            ],
            Combine::Any,
        );
        assert!(!rule_matches(&neither, &rec, "g"));
    }

    #[test]
    fn test_empty_lists() {
        let rec = record();
        assert!(rule_matches(&rule(vec![], Combine::All), &rec, "g"));
        assert!(!rule_matches(&rule(vec![], Combine::Any), &rec, "g"));
    }

    #[test]
    fn test_nested_group_negation() {
        let rec = record();
        let group = Predicate::Group {
            mode: Combine::All,
            children: vec![
                pattern("Subject", "announcing", false),
                pattern("From", "alice", false),
            ],
            negate: true,
        };
        assert!(!predicate_matches(&group, &rec, "g"));
    }

    #[test]
    fn test_date_comment_tolerated() {
        assert!(parse_article_date("Mon, 01 Jan 2024 10:00:00 +0000 (UTC)").is_some());
        assert!(parse_article_date("garbage").is_none());
    }
}
