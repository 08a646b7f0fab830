//! Overview record assembly
//!
//! Two input shapes produce the same [`OverviewRecord`]: a pre-split
//! tab-delimited bulk overview line (OVER/XOVER), and a raw header block
//! from a HEAD fetch with RFC 5322 line folding still in place.

use tracing::warn;

use crate::error::{Result, ScoreError};
use crate::record::{OverviewRecord, infer_parent_id};
use crate::schema::OverviewSchema;

/// Parse one bulk overview line against the negotiated schema
///
/// Format: tab-separated fields in schema order, first field is the numeric
/// article id. Fields flagged "full" carry a `"<name>: "` prefix which is
/// stripped. A short or id-less line is an error; the caller skips it and
/// continues.
pub fn parse_over_line(
    line: &str,
    schema: &OverviewSchema,
    wanted: &[String],
    infer_references: bool,
) -> Result<OverviewRecord> {
    let parts: Vec<&str> = line.split('\t').collect();

    // The standard seven fields must be present; trailing schema fields
    // (Xref and friends) may legitimately be missing.
    let required = schema.fields().len().min(7);
    if parts.len() < 1 + required {
        return Err(ScoreError::InvalidResponse(line.to_string()));
    }

    let number: u64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| ScoreError::InvalidResponse(line.to_string()))?;

    let mut record = OverviewRecord::new(number);
    for name in wanted {
        record.request_extra(name);
    }

    let mut in_reply_to: Option<String> = None;
    for (idx, field) in schema.fields().iter().enumerate() {
        let Some(raw) = parts.get(idx + 1) else {
            break;
        };
        let value = if field.full {
            strip_full_prefix(raw, &field.name)
        } else {
            raw
        };

        let name = field.name.as_str();
        if name.eq_ignore_ascii_case("Subject") {
            record.subject = value.to_string();
        } else if name.eq_ignore_ascii_case("From") {
            record.from = value.to_string();
        } else if name.eq_ignore_ascii_case("Date") {
            record.date = value.to_string();
        } else if name.eq_ignore_ascii_case("Message-ID") {
            record.message_id = value.to_string();
        } else if name.eq_ignore_ascii_case("References") {
            record.references = value.to_string();
        } else if name.eq_ignore_ascii_case("Bytes") {
            record.bytes = value.trim().parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("Lines") {
            record.lines = value.trim().parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("Xref") {
            record.xref = value.to_string();
        } else {
            if name.eq_ignore_ascii_case("In-Reply-To") {
                in_reply_to = Some(value.to_string());
            }
            if wanted.iter().any(|w| w.eq_ignore_ascii_case(name)) {
                record.set_extra(name, value.to_string());
            }
        }
    }

    if infer_references && record.references.is_empty() {
        if let Some(parent) = in_reply_to.as_deref().and_then(infer_parent_id) {
            record.references = parent.to_string();
        }
    }

    Ok(record)
}

/// Strip the `"<name>:"` prefix from a "full" overview field value
fn strip_full_prefix<'a>(value: &'a str, name: &str) -> &'a str {
    match (value.get(..name.len()), value.as_bytes().get(name.len())) {
        (Some(prefix), Some(b':')) if prefix.eq_ignore_ascii_case(name) => {
            value[name.len() + 1..].trim_start()
        }
        _ => value,
    }
}

/// Assemble a record from one raw HEAD response block
///
/// Continuation lines (leading space or tab) are folded onto the previous
/// logical line with a single space. Header names match the seven standard
/// fields and any `wanted` extra case-insensitively and exact-length. A
/// name-less line marks the record malformed but assembly continues.
///
/// After a full header fetch every wanted extra is known, so extras absent
/// from the block finish as retrieved-but-blank.
pub fn assemble_head(
    number: u64,
    lines: &[String],
    wanted: &[String],
    infer_references: bool,
) -> OverviewRecord {
    let mut record = OverviewRecord::new(number);
    for name in wanted {
        record.request_extra(name);
    }

    let mut in_reply_to: Option<String> = None;
    for logical in unfold_lines(lines) {
        let Some((name, value)) = logical.split_once(':') else {
            warn!("article {}: header line without a colon", number);
            record.malformed = true;
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            record.malformed = true;
            continue;
        }

        if name.eq_ignore_ascii_case("Subject") {
            record.subject = value.to_string();
        } else if name.eq_ignore_ascii_case("From") {
            record.from = value.to_string();
        } else if name.eq_ignore_ascii_case("Date") {
            record.date = value.to_string();
        } else if name.eq_ignore_ascii_case("Message-ID") {
            record.message_id = value.to_string();
        } else if name.eq_ignore_ascii_case("References") {
            record.references = value.to_string();
        } else if name.eq_ignore_ascii_case("Bytes") {
            record.bytes = value.parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("Lines") {
            record.lines = value.parse().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("Xref") {
            record.xref = value.to_string();
        } else {
            if name.eq_ignore_ascii_case("In-Reply-To") {
                in_reply_to = Some(value.to_string());
            }
            if wanted.iter().any(|w| w.eq_ignore_ascii_case(name)) {
                record.set_extra(name, value.to_string());
            }
        }
    }

    if infer_references && record.references.is_empty() {
        if let Some(parent) = in_reply_to.as_deref().and_then(infer_parent_id) {
            record.references = parent.to_string();
        }
    }

    // Everything was fetched, so unseen extras are known blank
    for (_, value) in record.extra.iter_mut() {
        if value.is_none() {
            *value = Some(String::new());
        }
    }

    record
}

/// Reassemble folded header lines into logical lines
///
/// A continuation line begins with space or tab and is joined to its parent
/// with a single space.
fn unfold_lines(lines: &[String]) -> Vec<String> {
    let mut logical: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.is_empty() {
            continue;
        }
        let is_continuation = line.starts_with(' ') || line.starts_with('\t');
        match logical.last_mut() {
            Some(prev) if is_continuation => {
                if !prev.ends_with(' ') {
                    prev.push(' ');
                }
                prev.push_str(line.trim_start());
            }
            _ => logical.push(line.clone()),
        }
    }

    logical
}
