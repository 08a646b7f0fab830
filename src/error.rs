//! Error types for overview acquisition and score compilation

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by overview retrieval and scorefile handling
#[derive(Error, Debug)]
pub enum ScoreError {
    /// IO error while reading a scorefile
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure during retrieval (read failure, connection loss)
    ///
    /// Fatal to the current retrieval operation; distinct from a clean
    /// end-of-range, which surfaces as `Ok(None)` from iteration.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connection closed mid-stream
    #[error("connection closed")]
    ConnectionClosed,

    /// NNTP protocol error with response code
    #[error("NNTP error {code}: {message}")]
    Protocol {
        /// NNTP response code (e.g., 423, 430, 503)
        code: u16,
        /// Error message from server
        message: String,
    },

    /// Malformed response line from the server
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Acquisition used before `open` or after `close`
    #[error("no retrieval in progress")]
    NotOpen,

    /// Scorefile compile error with source location
    #[error("{file}:{line}: {reason}: {text}")]
    Compile {
        /// Scorefile the error occurred in
        file: PathBuf,
        /// 1-based line number
        line: usize,
        /// Offending line text
        text: String,
        /// Short reason string
        reason: String,
    },

    /// Scorefile include cycle
    #[error("include cycle: {0}")]
    IncludeCycle(PathBuf),
}

impl ScoreError {
    /// Build a compile error for one scorefile line
    pub(crate) fn compile(
        file: &std::path::Path,
        line: usize,
        text: &str,
        reason: impl Into<String>,
    ) -> Self {
        ScoreError::Compile {
            file: file.to_path_buf(),
            line,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using ScoreError
pub type Result<T> = std::result::Result<T, ScoreError>;
