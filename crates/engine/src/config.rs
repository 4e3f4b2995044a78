use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Free-agent pool in stock databases. Catalogs may define a different
/// reserve team; override via `[mutation] reserve_team_id`.
pub const DEFAULT_RESERVE_TEAM_ID: i64 = 119;

/// Similarity score below which a fuzzy candidate is rejected.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Fixed threshold for fuzzy name matches; not adaptive.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MutationConfig {
    /// Team that receives riders trimmed from participating teams.
    #[serde(default = "default_reserve_team_id")]
    pub reserve_team_id: i64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            reserve_team_id: DEFAULT_RESERVE_TEAM_ID,
        }
    }
}

/// How unmatched teams and riders appear in the exported document.
/// Downstream consumers distinguish "left out on purpose" from "not yet
/// matched", so the writer requires an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Omit unmatched entries entirely.
    Skip,
    /// Emit the entry with its scraped name but no resolved id.
    Placeholder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_unmatched_policy")]
    pub unmatched: UnmatchedPolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedPolicy::Skip,
        }
    }
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_reserve_team_id() -> i64 {
    DEFAULT_RESERVE_TEAM_ID
}

fn default_unmatched_policy() -> UnmatchedPolicy {
    UnmatchedPolicy::Skip
}

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let t = self.matching.fuzzy_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(EngineError::Config(format!(
                "fuzzy_threshold must be in (0, 1], got {t}"
            )));
        }
        if self.mutation.reserve_team_id <= 0 {
            return Err(EngineError::Config(format!(
                "reserve_team_id must be positive, got {}",
                self.mutation.reserve_team_id
            )));
        }
        Ok(())
    }
}
