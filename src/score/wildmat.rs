//! Newsgroup wildmat patterns
//!
//! Scorefile section headers name groups with the traditional news
//! wildcard syntax: `*` matches any run of characters, `?` matches one.
//! Patterns compile to anchored case-insensitive regexes at load time.

use regex::{Regex, RegexBuilder};

/// Compile one wildmat pattern into an anchored regex
pub fn compile_wildmat(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            // Everything else is literal, including regex metacharacters
            _ => source.push_str(&regex::escape(&ch.to_string())),
        }
    }
    source.push('$');

    RegexBuilder::new(&source).case_insensitive(true).build()
}
