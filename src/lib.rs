#![doc = include_str!("../README.md")]

/// Overview acquisition strategy engine
pub mod acquire;
/// Bulk-line parsing and folded-header assembly
pub mod assemble;
mod capabilities;
mod config;
/// Message-id de-duplication cache
pub mod dedup;
mod error;
/// Additional-header request tracking
pub mod headers;
/// Per-article overview records
pub mod record;
mod schema;
/// Scorefile compilation and evaluation
pub mod score;
mod transport;

pub use acquire::{Acquisition, Strategy};
pub use assemble::{assemble_head, parse_over_line};
pub use capabilities::Capabilities;
pub use config::SessionConfig;
pub use dedup::{HashIdCache, IdStatus, MessageIdCache};
pub use error::{Result, ScoreError};
pub use headers::{HeaderCost, HeaderRequest, HeaderRequests};
pub use record::{OverviewRecord, infer_parent_id};
pub use schema::{OverviewSchema, SchemaField};
pub use score::{
    Combine, GroupSelector, IntField, Predicate, Provenance, Rule, ScoreForest,
    ScorefileCompiler, ScoringEngine,
};
pub use transport::Transport;
