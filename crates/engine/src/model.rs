use serde::Serialize;

// ---------------------------------------------------------------------------
// Parsed roster
// ---------------------------------------------------------------------------

/// A startlist extracted from one document. Team and rider order follows
/// the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub teams: Vec<RosterTeam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterTeam {
    pub name: String,
    pub riders: Vec<RosterRider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRider {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl RosterRider {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nationality: None,
            position: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference rows (loaded by velostart-io)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReferenceTeam {
    pub id: i64,
    pub name: String,
    pub short_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReferenceRider {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Current affiliation; free agents may have none.
    pub team_id: Option<i64>,
}

impl ReferenceRider {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ---------------------------------------------------------------------------
// Match results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Unmatched,
    /// Several candidates survived the tie-break tier; the chosen one is
    /// still recorded so downstream steps are never blocked.
    Ambiguous,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Unmatched => write!(f, "unmatched"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamMatch {
    pub scraped_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    pub status: MatchStatus,
    pub riders: Vec<RiderMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiderMatch {
    pub scraped_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    pub status: MatchStatus,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub teams_total: usize,
    pub teams_matched: usize,
    pub teams_unmatched: usize,
    pub teams_ambiguous: usize,
    pub riders_total: usize,
    pub riders_matched: usize,
    pub riders_unmatched: usize,
    pub riders_ambiguous: usize,
}

impl ReportSummary {
    pub fn from_teams(teams: &[TeamMatch]) -> Self {
        let mut s = Self::default();
        for team in teams {
            s.teams_total += 1;
            match team.status {
                MatchStatus::Matched => s.teams_matched += 1,
                MatchStatus::Unmatched => s.teams_unmatched += 1,
                MatchStatus::Ambiguous => s.teams_ambiguous += 1,
            }
            for rider in &team.riders {
                s.riders_total += 1;
                match rider.status {
                    MatchStatus::Matched => s.riders_matched += 1,
                    MatchStatus::Unmatched => s.riders_unmatched += 1,
                    MatchStatus::Ambiguous => s.riders_ambiguous += 1,
                }
            }
        }
        s
    }

    pub fn unmatched(&self) -> usize {
        self.teams_unmatched + self.riders_unmatched
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub layout: String,
}

/// Result of matching one roster against one catalog snapshot. Immutable
/// once produced; consumed by either the exporter or the mutator.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub teams: Vec<TeamMatch>,
}

impl MatchReport {
    /// Ids of every team the report resolved (ambiguous picks included,
    /// since resolution proceeds with the chosen candidate).
    pub fn resolved_team_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.teams.iter().filter_map(|t| t.team_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Ids of every rider the report resolved. Unique by construction:
    /// the matcher never hands out the same catalog id twice.
    pub fn resolved_rider_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .teams
            .iter()
            .flat_map(|t| t.riders.iter())
            .filter_map(|r| r.rider_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Scraped rider names that resolved to nothing, in document order.
    pub fn unmatched_rider_names(&self) -> Vec<&str> {
        self.teams
            .iter()
            .flat_map(|t| t.riders.iter())
            .filter(|r| r.rider_id.is_none())
            .map(|r| r.scraped_name.as_str())
            .collect()
    }
}
