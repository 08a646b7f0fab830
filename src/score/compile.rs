//! Scorefile compiler
//!
//! Line-oriented recursive-descent parser for the scorefile language:
//!
//! ```text
//! [comp.lang.*, comp.misc]      section: wildmat group selector, ~ negates
//! Score: 20 # short description weighted rule, predicates AND-combined
//! Score:: 20                    OR-combined predicate list
//! Score:= -9999                 terminal rule: a match fixes the score
//! Expires: 12/31/2026           drop the rule after this date
//! Subject: \[ANN\]              predicate: case-insensitive regex
//! ~From: bot@                   negated predicate
//! Lines: 500                    integer threshold (matches when exceeded)
//! {:                            nested AND group ({:: for OR), } closes
//! include extra.score           recursive include, cycles rejected
//! ```
//!
//! Any malformed directive aborts the whole load with file/line/text
//! diagnostics; nothing from a failed load becomes active.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use regex::RegexBuilder;
use tracing::warn;

use crate::error::{Result, ScoreError};
use crate::score::rules::{
    Combine, GroupSelector, IntField, Predicate, Provenance, Rule, ScoreForest,
};
use crate::score::wildmat::compile_wildmat;

/// Defensive bound on `{:` nesting
const MAX_GROUP_DEPTH: usize = 32;

/// Compiles a scorefile set into a [`ScoreForest`]
///
/// Age cutoffs and expiry checks are fixed against the clock captured at
/// construction; they go stale until the next compile, which is the only
/// recompute point.
#[must_use]
#[derive(Debug)]
pub struct ScorefileCompiler {
    now: DateTime<Utc>,
    today: NaiveDate,
    forest: ScoreForest,
    visited: HashSet<PathBuf>,
}

impl ScorefileCompiler {
    /// Create a compiler against the current wall clock
    pub fn new() -> Self {
        Self::with_clock(Utc::now(), Local::now().date_naive())
    }

    /// Create a compiler against a fixed clock
    pub fn with_clock(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self {
            now,
            today,
            forest: ScoreForest::default(),
            visited: HashSet::new(),
        }
    }

    /// Compile the scorefile set, in order, into one forest
    ///
    /// All-or-nothing: any error discards everything parsed so far.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::Compile`] with file, 1-based line number,
    /// offending line text, and reason, or [`ScoreError::Io`] if a
    /// top-level file cannot be read.
    pub fn compile(mut self, paths: &[PathBuf]) -> Result<ScoreForest> {
        for path in paths {
            self.parse_file(path)?;
        }
        self.finalize();
        Ok(self.forest)
    }

    /// Drop rules whose expiry date has passed; non-fatal, logged
    fn finalize(&mut self) {
        for selector in &mut self.forest.selectors {
            selector.rules.retain(|rule| {
                if rule.expired {
                    warn!(
                        "{}:{}: rule expired, dropped",
                        rule.provenance.file.display(),
                        rule.provenance.line
                    );
                }
                !rule.expired
            });
        }
    }

    fn parse_file(&mut self, path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(canonical) {
            return Err(ScoreError::IncludeCycle(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        let lines: Vec<&str> = text.lines().collect();

        let mut pos = 0;
        while pos < lines.len() {
            self.parse_directive(path, &lines, &mut pos)?;
        }
        Ok(())
    }

    fn parse_directive(&mut self, path: &Path, lines: &[&str], pos: &mut usize) -> Result<()> {
        let lineno = *pos + 1;
        let raw = lines[*pos];
        *pos += 1;

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            return Ok(());
        }

        if line.starts_with('[') {
            return self.parse_section(path, lineno, raw, line);
        }
        if let Some(rest) = keyword(line, "include") {
            return self.parse_include(path, lineno, raw, rest);
        }
        if let Some(rest) = keyword(line, "Score:") {
            return self.parse_score(path, lineno, raw, rest);
        }
        if let Some(rest) = keyword(line, "Expires:") {
            return self.parse_expires(path, lineno, raw, rest);
        }
        if let Some(mode) = group_opener(line) {
            let negate = line.starts_with('~');
            let group = self.parse_group(path, lines, pos, mode, negate, 1)?;
            return self.push_predicate(path, lineno, raw, group);
        }
        if line == "}" {
            return Err(ScoreError::compile(path, lineno, raw, "unmatched '}'"));
        }

        let predicate = self.compile_predicate(path, lineno, raw, line)?;
        self.push_predicate(path, lineno, raw, predicate)
    }

    fn parse_section(&mut self, path: &Path, lineno: usize, raw: &str, line: &str) -> Result<()> {
        let Some(inner) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "unterminated section header",
            ));
        };

        let inner = inner.trim();
        let (negate, inner) = match inner.strip_prefix('~') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, inner),
        };

        let mut patterns = Vec::new();
        for name in inner.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let regex = compile_wildmat(name).map_err(|e| {
                ScoreError::compile(path, lineno, raw, format!("bad group pattern: {}", e))
            })?;
            patterns.push(regex);
        }
        if patterns.is_empty() {
            return Err(ScoreError::compile(path, lineno, raw, "empty section header"));
        }

        self.forest.selectors.push(GroupSelector {
            patterns,
            negate,
            rules: Vec::new(),
        });
        Ok(())
    }

    fn parse_include(&mut self, path: &Path, lineno: usize, raw: &str, rest: &str) -> Result<()> {
        let target = rest.trim();
        if target.is_empty() {
            return Err(ScoreError::compile(path, lineno, raw, "include without a path"));
        }

        // Relative to the including file's directory
        let resolved = match path.parent() {
            Some(dir) => dir.join(target),
            None => PathBuf::from(target),
        };

        match self.parse_file(&resolved) {
            Ok(()) => Ok(()),
            Err(err @ ScoreError::Compile { .. }) => Err(err),
            Err(err) => Err(ScoreError::compile(
                path,
                lineno,
                raw,
                format!("include failed: {}", err),
            )),
        }
    }

    fn parse_score(&mut self, path: &Path, lineno: usize, raw: &str, rest: &str) -> Result<()> {
        let mut rest = rest.trim_start();
        let mut mode = Combine::All;
        let mut terminal = false;
        if let Some(r) = rest.strip_prefix('=') {
            terminal = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix(':') {
            mode = Combine::Any;
            rest = r;
        }

        let (number, description) = match rest.find(['#', '%']) {
            Some(idx) => {
                let desc = rest[idx + 1..].trim();
                (
                    rest[..idx].trim(),
                    (!desc.is_empty()).then(|| desc.to_string()),
                )
            }
            None => (rest.trim(), None),
        };

        let score: i32 = number.parse().map_err(|_| {
            ScoreError::compile(path, lineno, raw, "Score: needs an integer")
        })?;

        let Some(selector) = self.forest.selectors.last_mut() else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "Score: before any [section]",
            ));
        };

        selector.rules.push(Rule {
            predicates: Vec::new(),
            mode,
            score,
            terminal,
            provenance: Provenance {
                file: path.to_path_buf(),
                line: lineno,
                description,
            },
            expired: false,
        });
        Ok(())
    }

    fn parse_expires(&mut self, path: &Path, lineno: usize, raw: &str, rest: &str) -> Result<()> {
        let Some(date) = parse_expiry_date(rest.trim()) else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "Expires: needs MM/DD/YYYY or DD-MM-YYYY",
            ));
        };

        let today = self.today;
        let Some(rule) = self
            .forest
            .selectors
            .last_mut()
            .and_then(|s| s.rules.last_mut())
        else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "Expires: without a preceding Score:",
            ));
        };
        if !rule.predicates.is_empty() {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "Expires: must immediately follow Score:",
            ));
        }

        if date < today {
            rule.expired = true;
        }
        Ok(())
    }

    fn parse_group(
        &mut self,
        path: &Path,
        lines: &[&str],
        pos: &mut usize,
        mode: Combine,
        negate: bool,
        depth: usize,
    ) -> Result<Predicate> {
        let opener_line = *pos; // already advanced past the opener
        if depth > MAX_GROUP_DEPTH {
            return Err(ScoreError::compile(
                path,
                opener_line,
                lines[opener_line - 1],
                "group nesting too deep",
            ));
        }

        let mut children = Vec::new();
        while *pos < lines.len() {
            let lineno = *pos + 1;
            let raw = lines[*pos];
            *pos += 1;

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
                continue;
            }
            if line == "}" {
                return Ok(Predicate::Group {
                    mode,
                    children,
                    negate,
                });
            }
            if let Some(inner_mode) = group_opener(line) {
                let inner_negate = line.starts_with('~');
                let child = self.parse_group(path, lines, pos, inner_mode, inner_negate, depth + 1)?;
                children.push(child);
                continue;
            }
            if line.starts_with('[')
                || keyword(line, "Score:").is_some()
                || keyword(line, "Expires:").is_some()
                || keyword(line, "include").is_some()
            {
                return Err(ScoreError::compile(
                    path,
                    lineno,
                    raw,
                    "directive inside an open '{:' block",
                ));
            }

            children.push(self.compile_predicate(path, lineno, raw, line)?);
        }

        Err(ScoreError::compile(
            path,
            opener_line,
            lines[opener_line - 1],
            "unterminated '{:' block",
        ))
    }

    fn push_predicate(
        &mut self,
        path: &Path,
        lineno: usize,
        raw: &str,
        predicate: Predicate,
    ) -> Result<()> {
        let Some(rule) = self
            .forest
            .selectors
            .last_mut()
            .and_then(|s| s.rules.last_mut())
        else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "predicate outside a Score: rule",
            ));
        };
        rule.predicates.push(predicate);
        Ok(())
    }

    fn compile_predicate(
        &mut self,
        path: &Path,
        lineno: usize,
        raw: &str,
        line: &str,
    ) -> Result<Predicate> {
        let (negate, line) = match line.strip_prefix('~') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, line),
        };

        let Some((field, value)) = line.split_once(':') else {
            return Err(ScoreError::compile(
                path,
                lineno,
                raw,
                "predicate needs 'field: value'",
            ));
        };
        let field = field.trim();
        let value = value.trim();
        if field.is_empty() {
            return Err(ScoreError::compile(path, lineno, raw, "predicate without a field"));
        }
        if value.is_empty() {
            return Err(ScoreError::compile(path, lineno, raw, "predicate without a value"));
        }

        if field.eq_ignore_ascii_case("Lines") || field.eq_ignore_ascii_case("Bytes") {
            let threshold: i64 = value.parse().map_err(|_| {
                ScoreError::compile(path, lineno, raw, "threshold needs an integer")
            })?;
            let int_field = if field.eq_ignore_ascii_case("Lines") {
                IntField::Lines
            } else {
                IntField::Bytes
            };
            return Ok(Predicate::Threshold {
                field: int_field,
                value: threshold,
                negate,
            });
        }

        if field.eq_ignore_ascii_case("Has-Body") {
            let flag: i64 = value.parse().map_err(|_| {
                ScoreError::compile(path, lineno, raw, "Has-Body needs 0 or 1")
            })?;
            return Ok(Predicate::HasBody {
                value: flag != 0,
                negate,
            });
        }

        if field.eq_ignore_ascii_case("Age") {
            let days: i64 = value.parse().map_err(|_| {
                ScoreError::compile(path, lineno, raw, "Age needs a number of days")
            })?;
            return Ok(Predicate::Age {
                cutoff: self.now - Duration::days(days),
                negate,
            });
        }

        let pattern = RegexBuilder::new(value)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                ScoreError::compile(path, lineno, raw, format!("bad regex: {}", e))
            })?;
        Ok(Predicate::Pattern {
            field: field.to_string(),
            pattern,
            negate,
        })
    }
}

impl Default for ScorefileCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive keyword prefix match; returns the remainder
fn keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let prefix = line.get(..kw.len())?;
    if prefix.eq_ignore_ascii_case(kw) {
        // Bare "include" must be followed by whitespace
        if !kw.ends_with(':') {
            let rest = &line[kw.len()..];
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            return Some(rest);
        }
        Some(&line[kw.len()..])
    } else {
        None
    }
}

/// Recognize `{:` / `{::` group openers, with optional leading `~`
fn group_opener(line: &str) -> Option<Combine> {
    let body = line.strip_prefix('~').map(str::trim_start).unwrap_or(line);
    match body {
        "{:" => Some(Combine::All),
        "{::" => Some(Combine::Any),
        _ => None,
    }
}

/// Parse an Expires: date as MM/DD/YYYY or DD-MM-YYYY
fn parse_expiry_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .ok()
}
