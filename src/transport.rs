//! Transport facade
//!
//! Acquisition never touches a socket. The host supplies an implementation
//! of [`Transport`] wrapping its real NNTP connection (command dispatch,
//! TLS, timeouts all live below this boundary), and acquisition drives it
//! through five verbs: capability probe, bulk overview range, header-field
//! range, single full header, and next-line-of-stream.

use crate::capabilities::Capabilities;
use crate::error::Result;

/// Abstract capability-queryable line source over an NNTP connection
///
/// Streamed verbs (`start_overview`, `start_field`) are followed by
/// repeated [`next_line`](Transport::next_line) calls; `Ok(None)` is the
/// clean `.` terminator, while a dropped connection mid-stream must surface
/// as [`ScoreError::ConnectionClosed`](crate::ScoreError::ConnectionClosed)
/// or [`ScoreError::Transport`](crate::ScoreError::Transport) so callers
/// can tell the two apart.
///
/// There is at most one stream in flight at a time; starting a new stream
/// discards the remainder of the previous one.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Probe server capabilities (CAPABILITIES)
    async fn probe_capabilities(&mut self) -> Result<Capabilities>;

    /// Fetch the advertised overview field order (LIST OVERVIEW.FMT)
    ///
    /// Returns `Ok(None)` when the server does not support the listing;
    /// the caller falls back to the RFC 3977 default order.
    async fn overview_fmt(&mut self) -> Result<Option<Vec<String>>>;

    /// Begin a bulk overview stream over `[min, max]` (OVER/XOVER)
    async fn start_overview(&mut self, min: u64, max: u64) -> Result<()>;

    /// Begin a single-header-field stream over `[min, max]` (HDR/XHDR)
    async fn start_field(&mut self, header: &str, min: u64, max: u64) -> Result<()>;

    /// Read the next line of the current multi-line stream
    ///
    /// `Ok(None)` means the stream ended cleanly at its terminator.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Fetch one article's full header block (HEAD)
    ///
    /// Returns `Ok(None)` when the server has no article with that number
    /// (backlog gap), which the sequential strategy skips over.
    async fn fetch_head(&mut self, number: u64) -> Result<Option<Vec<String>>>;
}
