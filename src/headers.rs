//! Additional-header requests
//!
//! Score rules may reference headers outside the standard seven. Each such
//! reference becomes a request the acquisition layer must satisfy: either
//! the negotiated overview schema already carries the field ("cheap"), or
//! it takes a per-field query or a full HEAD fetch ("expensive").
//!
//! Requests are created by rule compilation and cleared when a newsgroup's
//! rule set closes.

use crate::schema::OverviewSchema;

/// Retrieval cost of one requested header, relative to the negotiated
/// schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCost {
    /// The bulk overview format supplies it without extra round trips
    Cheap,
    /// Requires a per-field query or a full header fetch
    Expensive,
}

/// One header the scoring engine needs beyond the standard seven
#[derive(Debug, Clone)]
pub struct HeaderRequest {
    /// Header name as written in the scorefile
    pub name: String,
    /// Values have been fetched for the current range
    pub retrieved: bool,
    /// Known once the schema has been negotiated
    pub cost: Option<HeaderCost>,
}

/// Ordered list of additional-header requests
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct HeaderRequests {
    requests: Vec<HeaderRequest>,
}

impl HeaderRequests {
    /// Create an empty request list
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a header by name; duplicates (case-insensitive) collapse
    pub fn add(&mut self, name: &str) {
        if self
            .requests
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(name))
        {
            return;
        }
        self.requests.push(HeaderRequest {
            name: name.to_string(),
            retrieved: false,
            cost: None,
        });
    }

    /// Requested header names in current order
    pub fn names(&self) -> Vec<String> {
        self.requests.iter().map(|r| r.name.clone()).collect()
    }

    /// Number of pending requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no headers are requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Classify every request against the negotiated schema and move the
    /// cheap ones to the front, preserving relative order within each class
    ///
    /// Cheap fields come out of the bulk stream for free, so they are
    /// satisfied first; the expensive tail is what per-field backfill or
    /// the HEAD fallback must cover.
    pub fn classify(&mut self, schema: &OverviewSchema) {
        for req in &mut self.requests {
            req.cost = Some(if schema.supplies(&req.name) {
                HeaderCost::Cheap
            } else {
                HeaderCost::Expensive
            });
        }
        self.requests
            .sort_by_key(|r| matches!(r.cost, Some(HeaderCost::Expensive)));
    }

    /// Names the schema cannot supply
    pub fn expensive_names(&self) -> Vec<String> {
        self.requests
            .iter()
            .filter(|r| r.cost == Some(HeaderCost::Expensive))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Whether any request needs retrieval beyond the bulk stream
    #[must_use]
    pub fn any_expensive(&self) -> bool {
        self.requests
            .iter()
            .any(|r| r.cost == Some(HeaderCost::Expensive))
    }

    /// Whether a header's values have been fetched for the current range
    #[must_use]
    pub fn is_retrieved(&self, name: &str) -> bool {
        self.requests
            .iter()
            .any(|r| r.retrieved && r.name.eq_ignore_ascii_case(name))
    }

    /// Reset per-range retrieval state when a new range opens
    pub fn reset_retrieved(&mut self) {
        for req in &mut self.requests {
            req.retrieved = false;
        }
    }

    /// Mark a header's values as fetched for the current range
    pub fn mark_retrieved(&mut self, name: &str) {
        if let Some(req) = self
            .requests
            .iter_mut()
            .find(|r| r.name.eq_ignore_ascii_case(name))
        {
            req.retrieved = true;
        }
    }

    /// Drop all requests (newsgroup rule set closed)
    pub fn clear(&mut self) {
        self.requests.clear();
    }
}
