use std::fmt;

use crate::events::Stage;

/// Fatal run errors. Per-record non-matches are not errors; they surface
/// as `Unmatched` statuses in the report and on the event stream.
#[derive(Debug)]
pub enum EngineError {
    /// Document unreadable, empty, or no known layout yielded any teams.
    Parse(String),
    /// Config TOML parse or validation failure.
    Config(String),
    /// Catalog source missing or structurally incompatible.
    CatalogLoad(String),
    /// Failed producing the startlist output document.
    Export(String),
    /// Mutation of the working database copy failed; the original store
    /// is untouched and the working copy has been discarded.
    Mutation(String),
    /// The external CDB converter failed or was not found.
    Conversion(String),
    /// Run cancelled at a stage boundary.
    Cancelled(Stage),
}

impl EngineError {
    /// Pipeline stage the error belongs to, when it occurred inside a run.
    /// Config errors happen before a run starts and carry no stage.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Parse(_) => Some(Stage::Parsing),
            Self::Config(_) => None,
            Self::CatalogLoad(_) => Some(Stage::LoadingCatalog),
            Self::Export(_) => Some(Stage::Exporting),
            Self::Mutation(_) | Self::Conversion(_) => Some(Stage::Mutating),
            Self::Cancelled(stage) => Some(*stage),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::CatalogLoad(msg) => write!(f, "catalog load error: {msg}"),
            Self::Export(msg) => write!(f, "export error: {msg}"),
            Self::Mutation(msg) => write!(f, "mutation failed: {msg}"),
            Self::Conversion(msg) => write!(f, "conversion error: {msg}"),
            Self::Cancelled(stage) => write!(f, "cancelled during {stage}"),
        }
    }
}

impl std::error::Error for EngineError {}
