//! Negotiated overview schema (RFC 3977 Section 8.4)
//!
//! LIST OVERVIEW.FMT describes the field order the server uses in OVER
//! responses. The first OVER field is always the article number; the lines
//! of the FMT response name what follows it. Metadata fields are spelled
//! with a leading colon (":bytes", ":lines"), and a field may carry a
//! "full" suffix ("Xref:full") meaning its value arrives prefixed with the
//! field name, which must be stripped.
//!
//! Rebuilt once per server session and read-only afterward.

/// One field position in the negotiated overview format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Header name without colons ("Subject", "bytes", "Xref")
    pub name: String,
    /// Value arrives as `"<name>: <value>"` and the prefix must be stripped
    pub full: bool,
}

/// Server-declared field order for bulk overview responses
#[must_use]
#[derive(Debug, Clone)]
pub struct OverviewSchema {
    fields: Vec<SchemaField>,
    xref: Option<usize>,
}

impl OverviewSchema {
    /// Parse a LIST OVERVIEW.FMT response body
    ///
    /// Unknown or oddly spelled lines are kept positionally; the field
    /// order is what matters for splitting OVER lines.
    pub fn parse(lines: &[String]) -> Self {
        let mut fields = Vec::with_capacity(lines.len());
        let mut xref = None;

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (name, full) = if let Some(meta) = line.strip_prefix(':') {
                // Metadata field, ":bytes" / ":lines"
                (meta.trim_end_matches(':').to_string(), false)
            } else if let Some(name) = line.strip_suffix(":full") {
                (name.to_string(), true)
            } else {
                (line.trim_end_matches(':').to_string(), false)
            };

            if name.eq_ignore_ascii_case("xref") && xref.is_none() {
                xref = Some(fields.len());
            }
            fields.push(SchemaField { name, full });
        }

        Self { fields, xref }
    }

    /// The RFC 3977 default overview order, used when the server advertises
    /// OVER but not LIST OVERVIEW.FMT
    pub fn rfc3977_default() -> Self {
        let names = [
            "Subject",
            "From",
            "Date",
            "Message-ID",
            "References",
            "bytes",
            "lines",
        ];
        Self {
            fields: names
                .iter()
                .map(|n| SchemaField {
                    name: n.to_string(),
                    full: false,
                })
                .collect(),
            xref: None,
        }
    }

    /// Ordered fields following the article number
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Position of a field within the schema (0 = first field after the
    /// article number), case-insensitive
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Whether the bulk format can supply this header without extra round
    /// trips
    #[must_use]
    pub fn supplies(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Position of the designated cross-reference field, if any
    #[must_use]
    pub fn xref_position(&self) -> Option<usize> {
        self.xref
    }
}

impl Default for OverviewSchema {
    fn default() -> Self {
        Self::rfc3977_default()
    }
}
