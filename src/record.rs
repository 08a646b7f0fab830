//! Per-article overview records

/// One article's summary data
///
/// Created fresh per article by the assembler and consumed once by the
/// evaluator and the article list. Owns all of its string storage.
///
/// Extra headers requested by score rules live in an ordered list where
/// `None` means "not yet retrieved" and `Some("")` means "retrieved but
/// blank". The distinction matters because the evaluator must never see an
/// unretrieved field.
#[derive(Debug, Clone, Default)]
pub struct OverviewRecord {
    /// Article number within the newsgroup
    pub number: u64,
    /// Subject line
    pub subject: String,
    /// Author (From header)
    pub from: String,
    /// Date header, unparsed
    pub date: String,
    /// Unique message-id
    pub message_id: String,
    /// References to parent articles (for threading)
    pub references: String,
    /// Cross-reference header, if the server supplies one
    pub xref: String,
    /// Article size in bytes
    pub bytes: u64,
    /// Number of body lines
    pub lines: u64,
    /// Whether the article body is present (spool-backed hosts may clear
    /// this; network retrieval leaves it set)
    pub has_body: bool,
    /// Requested non-standard headers, in request order
    pub extra: Vec<(String, Option<String>)>,
    /// Headers were malformed during assembly; scoring applies the invalid
    /// header penalty
    pub malformed: bool,
}

impl OverviewRecord {
    /// Create an empty record for the given article number
    pub fn new(number: u64) -> Self {
        Self {
            number,
            has_body: true,
            ..Self::default()
        }
    }

    /// Look up a field value by header name, case-insensitive
    ///
    /// Covers the standard string fields and any requested extra header.
    /// Returns `None` for an absent or unretrieved field; numeric fields
    /// (Bytes, Lines) are not reachable here.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("Subject") {
            return Some(&self.subject);
        }
        if name.eq_ignore_ascii_case("From") {
            return Some(&self.from);
        }
        if name.eq_ignore_ascii_case("Date") {
            return Some(&self.date);
        }
        if name.eq_ignore_ascii_case("Message-ID") {
            return Some(&self.message_id);
        }
        if name.eq_ignore_ascii_case("References") {
            return Some(&self.references);
        }
        if name.eq_ignore_ascii_case("Xref") {
            return Some(&self.xref);
        }
        self.extra
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Pre-seed an extra header slot as "not yet retrieved"
    pub fn request_extra(&mut self, name: &str) {
        if !self.extra.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
            self.extra.push((name.to_string(), None));
        }
    }

    /// Record a retrieved value for an extra header
    pub fn set_extra(&mut self, name: &str, value: String) {
        if let Some(slot) = self
            .extra
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            slot.1 = Some(value);
        } else {
            self.extra.push((name.to_string(), Some(value)));
        }
    }

    /// Whether any requested extra header is still unretrieved
    #[must_use]
    pub fn has_unresolved_extras(&self) -> bool {
        self.extra.iter().any(|(_, v)| v.is_none())
    }

    /// Extract this server's article number for `group` from the Xref field
    ///
    /// Xref format: `server group1:123 group2:456`. The group name must
    /// match a whole token up to its colon.
    #[must_use]
    pub fn local_number(&self, group: &str) -> Option<u64> {
        for token in self.xref.split_whitespace() {
            let Some((name, number)) = token.split_once(':') else {
                continue;
            };
            if name == group {
                return number.parse().ok();
            }
        }
        None
    }
}

/// Infer a single parent message-id from an In-Reply-To style field
///
/// Precedence: the first angle-bracketed token if the trimmed field starts
/// with one, else the last angle-bracketed token anywhere in the field,
/// else no inference.
#[must_use]
pub fn infer_parent_id(in_reply_to: &str) -> Option<&str> {
    let trimmed = in_reply_to.trim();
    if trimmed.starts_with('<') {
        let end = trimmed.find('>')?;
        return Some(&trimmed[..=end]);
    }

    // Last angle-bracketed token in the field
    let start = trimmed.rfind('<')?;
    let end = trimmed[start..].find('>')?;
    Some(&trimmed[start..=start + end])
}
