//! `velostart-engine` — startlist parsing and matching engine.
//!
//! Pure engine crate: receives document text and pre-loaded catalog rows,
//! returns a match report. No file or database IO.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod similarity;

pub use catalog::Catalog;
pub use config::{EngineConfig, MatchingConfig, UnmatchedPolicy, DEFAULT_RESERVE_TEAM_ID};
pub use error::EngineError;
pub use events::{CancelToken, EventSink, NullSink, RecordKind, RunEvent, Stage};
pub use matcher::match_roster;
pub use model::{MatchReport, MatchStatus, ReferenceRider, ReferenceTeam, Roster};
pub use parser::{parse_document, Layout};
