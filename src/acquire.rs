//! Overview acquisition strategy engine
//!
//! Chooses among three retrieval strategies per capability probe results
//! and per-session overrides, and drives iteration over an article-number
//! range:
//!
//! 1. **Bulk**: stream OVER lines for the whole range, the common case.
//! 2. **PerField**: HDR passes that backfill requested headers the
//!    negotiated overview format omits; runs before the bulk stream and
//!    suspends it (the two are never concurrent).
//! 3. **Sequential**: one HEAD per article, probing across backlog gaps;
//!    forced when the server cannot do bulk overview, when the session
//!    forces HEAD fetches, or when rules need headers the schema cannot
//!    supply and the server lacks per-field queries.
//!
//! Transport failures are fatal to the iteration; malformed or
//! out-of-window response lines are skipped.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::assemble::{assemble_head, parse_over_line};
use crate::capabilities::Capabilities;
use crate::config::SessionConfig;
use crate::error::{Result, ScoreError};
use crate::headers::HeaderRequests;
use crate::record::OverviewRecord;
use crate::schema::OverviewSchema;
use crate::transport::Transport;

/// Retrieval strategy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Streaming bulk overview lines (OVER)
    Bulk,
    /// Prefetching per-field backfill maps (HDR); suspends Bulk
    PerField,
    /// Probing full headers article by article (HEAD)
    Sequential,
    /// Range exhausted or closed
    Done,
}

/// Overview acquisition engine for one newsgroup at a time
///
/// `open` negotiates a strategy for an article range, `next_record` streams
/// assembled [`OverviewRecord`]s, `close` discards in-progress iteration
/// state. Capabilities and the overview schema are negotiated once per
/// session and reused across groups.
#[must_use]
#[derive(Debug)]
pub struct Acquisition<T: Transport> {
    transport: T,
    config: SessionConfig,
    requests: HeaderRequests,
    capabilities: Option<Capabilities>,
    schema: Option<OverviewSchema>,
    state: Strategy,
    group: String,
    min: u64,
    max: u64,
    cursor: u64,
    pending: Option<OverviewRecord>,
    backfill: HashMap<String, HashMap<u64, String>>,
    is_open: bool,
}

impl<T: Transport> Acquisition<T> {
    /// Create an engine over a transport
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            requests: HeaderRequests::new(),
            capabilities: None,
            schema: None,
            state: Strategy::Done,
            group: String::new(),
            min: 0,
            max: 0,
            cursor: 0,
            pending: None,
            backfill: HashMap::new(),
            is_open: false,
        }
    }

    /// Replace the additional-header request set for the next `open`
    ///
    /// Typically fed from
    /// [`ScoringEngine::requested_headers`](crate::ScoringEngine::requested_headers)
    /// after compiling the group's rules.
    pub fn request_headers(&mut self, names: Vec<String>) {
        self.requests.clear();
        for name in names {
            self.requests.add(&name);
        }
    }

    /// The strategy currently in effect
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.state
    }

    /// The negotiated overview schema, once bulk capability has been probed
    pub fn schema(&self) -> Option<&OverviewSchema> {
        self.schema.as_ref()
    }

    /// The newsgroup the current range was opened for
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Negotiate a retrieval strategy and begin iterating `[min, max]`
    ///
    /// Returns the strategy that will supply records. May block on the
    /// capability probe, the schema listing, per-field backfill passes,
    /// and (for the sequential strategy) the linear probe for the first
    /// existing article.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::Transport`] or
    /// [`ScoreError::ConnectionClosed`] on transport failure and
    /// [`ScoreError::Protocol`] on a server error response.
    pub async fn open(&mut self, group: &str, min: u64, max: u64) -> Result<Strategy> {
        self.close();
        self.group = group.to_string();
        self.min = min;
        self.max = max;
        self.cursor = min;
        self.is_open = true;

        self.negotiate().await?;
        let (bulk_available, field_available) = match &self.capabilities {
            Some(caps) => (caps.supports_bulk_overview(), caps.supports_field_query()),
            None => (false, false),
        };

        self.requests.reset_retrieved();
        if let Some(schema) = &self.schema {
            self.requests.classify(schema);
        }

        let use_bulk = bulk_available
            && !self.config.force_head
            && (!self.requests.any_expensive() || field_available);

        if use_bulk {
            if self.requests.any_expensive() {
                self.state = Strategy::PerField;
                debug!(
                    "group {}: per-field backfill for {} header(s) over {}-{}",
                    group,
                    self.requests.expensive_names().len(),
                    min,
                    max
                );
                self.backfill_fields().await?;
            }
            debug!("group {}: bulk overview {}-{}", group, min, max);
            self.transport.start_overview(min, max).await?;
            self.state = Strategy::Bulk;
        } else {
            debug!(
                "group {}: sequential HEAD fallback {}-{} (bulk={}, hdr={}, force_head={})",
                group, min, max, bulk_available, field_available, self.config.force_head
            );
            self.state = Strategy::Sequential;
            // Linear probe for the first article that actually exists;
            // server backlogs may have gaps at the front of the range.
            self.pending = self.probe_next_head().await?;
            if self.pending.is_none() {
                self.state = Strategy::Done;
            }
        }

        Ok(self.state)
    }

    /// Produce the next overview record, or `None` at clean end of range
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::NotOpen`] before `open`/after `close`, and
    /// transport/protocol errors as for [`open`](Acquisition::open).
    pub async fn next_record(&mut self) -> Result<Option<OverviewRecord>> {
        if !self.is_open {
            return Err(ScoreError::NotOpen);
        }

        match self.state {
            Strategy::Bulk => self.next_bulk().await,
            Strategy::Sequential => self.next_sequential().await,
            // open() never parks in PerField; reaching it here means the
            // caller raced a failed open
            Strategy::PerField => Err(ScoreError::NotOpen),
            Strategy::Done => Ok(None),
        }
    }

    /// Discard in-progress iteration state
    pub fn close(&mut self) {
        self.state = Strategy::Done;
        self.pending = None;
        self.backfill.clear();
        self.is_open = false;
    }

    /// Probe capabilities and negotiate the overview schema, once per
    /// session
    async fn negotiate(&mut self) -> Result<()> {
        if self.capabilities.is_none() {
            let caps = self.transport.probe_capabilities().await?;
            if caps.supports_bulk_overview() {
                let schema = if caps.supports_overview_fmt() {
                    match self.transport.overview_fmt().await? {
                        Some(lines) => OverviewSchema::parse(&lines),
                        None => OverviewSchema::rfc3977_default(),
                    }
                } else {
                    OverviewSchema::rfc3977_default()
                };
                debug!("negotiated overview schema: {} fields", schema.fields().len());
                self.schema = Some(schema);
            }
            self.capabilities = Some(caps);
        }
        Ok(())
    }

    /// Run one HDR pass per expensive header over the open window
    async fn backfill_fields(&mut self) -> Result<()> {
        for name in self.requests.expensive_names() {
            debug!("HDR {} {}-{}", name, self.min, self.max);
            self.transport
                .start_field(&name, self.min, self.max)
                .await?;

            let mut values: HashMap<u64, String> = HashMap::new();
            while let Some(line) = self.transport.next_line().await? {
                let (num, value) = match line.split_once(char::is_whitespace) {
                    Some((num, value)) => (num, value.trim()),
                    None => (line.as_str(), ""),
                };
                let Ok(number) = num.parse::<u64>() else {
                    warn!("skipping malformed HDR line: {}", line);
                    continue;
                };
                if number < self.min || number > self.max {
                    warn!("skipping out-of-window HDR entry {}", number);
                    continue;
                }
                values.insert(number, value.to_string());
            }

            self.backfill.insert(name.clone(), values);
            self.requests.mark_retrieved(&name);
        }
        Ok(())
    }

    async fn next_bulk(&mut self) -> Result<Option<OverviewRecord>> {
        let wanted = self.requests.names();
        let schema = match &self.schema {
            Some(schema) => schema.clone(),
            // Bulk state implies a negotiated schema
            None => return Err(ScoreError::NotOpen),
        };
        loop {
            let Some(line) = self.transport.next_line().await? else {
                self.state = Strategy::Done;
                return Ok(None);
            };

            let mut record = match parse_over_line(
                &line,
                &schema,
                &wanted,
                self.config.infer_references,
            ) {
                Ok(record) => record,
                Err(_) => {
                    warn!("skipping malformed overview line: {}", line);
                    continue;
                }
            };

            if record.number < self.min || record.number > self.max {
                warn!("skipping out-of-window overview entry {}", record.number);
                continue;
            }

            // Merge per-field backfill, then settle slots the schema or a
            // completed HDR pass covered as retrieved-but-blank
            for (name, values) in &self.backfill {
                if let Some(value) = values.get(&record.number) {
                    record.set_extra(name, value.clone());
                }
            }
            for (name, value) in record.extra.iter_mut() {
                if value.is_none()
                    && (schema.supplies(name) || self.requests.is_retrieved(name))
                {
                    *value = Some(String::new());
                }
            }

            return Ok(Some(record));
        }
    }

    async fn next_sequential(&mut self) -> Result<Option<OverviewRecord>> {
        if let Some(record) = self.pending.take() {
            return Ok(Some(record));
        }
        let record = self.probe_next_head().await?;
        if record.is_none() {
            self.state = Strategy::Done;
        }
        Ok(record)
    }

    /// Fetch the next existing article's headers, skipping gaps, or `None`
    /// at range exhaustion
    async fn probe_next_head(&mut self) -> Result<Option<OverviewRecord>> {
        let wanted = self.requests.names();
        while self.cursor <= self.max {
            let number = self.cursor;
            self.cursor += 1;
            match self.transport.fetch_head(number).await? {
                Some(lines) => {
                    let record = assemble_head(
                        number,
                        &lines,
                        &wanted,
                        self.config.infer_references,
                    );
                    return Ok(Some(record));
                }
                None => continue,
            }
        }
        Ok(None)
    }
}
