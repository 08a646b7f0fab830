//! Session configuration for acquisition and scoring

use std::path::PathBuf;

/// Configuration shared by one newsreader session
///
/// Owned by the host application and handed to [`Acquisition`](crate::Acquisition)
/// and [`ScoringEngine`](crate::ScoringEngine) at construction.
///
/// # Example
///
/// ```
/// use nntp_score::SessionConfig;
///
/// let config = SessionConfig::new(vec!["/home/user/.score".into()])
///     .with_kill_score(-9999);
/// ```
#[must_use]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Scorefiles to compile on every group open, in order
    pub score_files: Vec<PathBuf>,

    /// Score returned when the message-id cache reports a cross-posted
    /// duplicate, and the floor any rule combination can reach
    #[cfg_attr(feature = "serde", serde(default = "default_kill_score"))]
    pub kill_score: i32,

    /// Penalty applied when a record's headers were malformed
    #[cfg_attr(feature = "serde", serde(default = "default_invalid_header_penalty"))]
    pub invalid_header_penalty: i32,

    /// Force sequential HEAD retrieval even when the server advertises
    /// bulk overview
    #[cfg_attr(feature = "serde", serde(default))]
    pub force_head: bool,

    /// Infer a parent message-id from In-Reply-To when References is absent
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub infer_references: bool,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_kill_score() -> i32 {
    -9999
}

#[cfg(feature = "serde")]
fn default_invalid_header_penalty() -> i32 {
    -1
}

impl SessionConfig {
    /// Create a configuration with the given scorefile paths and defaults
    /// for everything else
    pub fn new(score_files: Vec<PathBuf>) -> Self {
        Self {
            score_files,
            kill_score: -9999,
            invalid_header_penalty: -1,
            force_head: false,
            infer_references: true,
        }
    }

    /// Override the kill score
    pub fn with_kill_score(mut self, score: i32) -> Self {
        self.kill_score = score;
        self
    }

    /// Force sequential HEAD retrieval for this session
    pub fn with_force_head(mut self, force: bool) -> Self {
        self.force_head = force;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
