//! Resolves scraped names against the reference catalog.
//!
//! Exact normalized-name candidates always beat fuzzy ones. Rider lookup
//! is scoped to the matched team first and widens to the whole catalog
//! only when the scoped search comes up empty, so same-named riders on
//! different teams resolve to the right one.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::config::MatchingConfig;
use crate::events::{EventSink, RecordKind, RunEvent};
use crate::model::{
    MatchReport, MatchStatus, ReferenceRider, ReportMeta, ReportSummary, RiderMatch, Roster,
    TeamMatch,
};
use crate::normalize::{name_splits, normalize};
use crate::parser::Layout;
use crate::similarity::{rider_similarity, team_similarity};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: i64,
    exact: bool,
    score: f64,
}

/// Deterministic selection: the exact tier wins over the fuzzy tier; within
/// a tier, higher score first, then the smallest id. More than one survivor
/// in the winning tier is reported as `Ambiguous` (with the chosen
/// candidate), never as a silent arbitrary pick.
///
/// Kept as the single tie-break point so the policy stays swappable.
fn pick_candidate(mut candidates: Vec<Candidate>) -> Option<(i64, MatchStatus)> {
    if candidates.is_empty() {
        return None;
    }
    let has_exact = candidates.iter().any(|c| c.exact);
    candidates.retain(|c| c.exact == has_exact);
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    let status = if candidates.len() == 1 {
        MatchStatus::Matched
    } else {
        MatchStatus::Ambiguous
    };
    Some((candidates[0].id, status))
}

fn match_team(
    scraped_name: &str,
    catalog: &Catalog,
    config: &MatchingConfig,
) -> (Option<i64>, MatchStatus) {
    let key = normalize(scraped_name);
    if key.is_empty() {
        return (None, MatchStatus::Unmatched);
    }

    let mut candidates: Vec<Candidate> = catalog
        .teams_by_name(&key)
        .iter()
        .map(|&id| Candidate {
            id,
            exact: true,
            score: 1.0,
        })
        .collect();

    if candidates.is_empty() {
        for team in catalog.teams() {
            let mut score = team_similarity(&key, &normalize(&team.name));
            if let Some(short) = &team.short_name {
                score = score.max(team_similarity(&key, &normalize(short)));
            }
            if score >= config.fuzzy_threshold {
                candidates.push(Candidate {
                    id: team.id,
                    exact: false,
                    score,
                });
            }
        }
    }

    match pick_candidate(candidates) {
        Some((id, status)) => (Some(id), status),
        None => (None, MatchStatus::Unmatched),
    }
}

/// Exact candidates straight from the catalog's full-name index (both
/// name orders are indexed). Scoped calls keep only riders affiliated
/// with the matched team; riders already claimed by an earlier record
/// are skipped so no catalog id resolves twice within one report.
fn exact_rider_candidates(
    catalog: &Catalog,
    key: &str,
    team_id: Option<i64>,
    claimed: &HashSet<i64>,
) -> Vec<Candidate> {
    catalog
        .riders_by_name(key)
        .iter()
        .copied()
        .filter(|id| !claimed.contains(id))
        .filter(|id| {
            team_id.is_none() || catalog.rider(*id).and_then(|r| r.team_id) == team_id
        })
        .map(|id| Candidate {
            id,
            exact: true,
            score: 1.0,
        })
        .collect()
}

/// Fuzzy candidates for one scraped name over a pool of riders, scored
/// against both readings of the name.
fn fuzzy_rider_candidates<'a>(
    pool: impl Iterator<Item = &'a ReferenceRider>,
    splits: Option<&[(String, String); 2]>,
    threshold: f64,
    claimed: &HashSet<i64>,
) -> Vec<Candidate> {
    let Some(splits) = splits else {
        return Vec::new();
    };
    let mut candidates = Vec::new();
    for rider in pool {
        if claimed.contains(&rider.id) {
            continue;
        }
        let cat_first = normalize(&rider.first_name);
        let cat_last = normalize(&rider.last_name);
        let score = splits
            .iter()
            .map(|(first, last)| rider_similarity(first, last, &cat_first, &cat_last))
            .fold(0.0_f64, f64::max);
        if score >= threshold {
            candidates.push(Candidate {
                id: rider.id,
                exact: false,
                score,
            });
        }
    }
    candidates
}

fn match_rider(
    scraped_name: &str,
    team_id: Option<i64>,
    catalog: &Catalog,
    config: &MatchingConfig,
    claimed: &HashSet<i64>,
) -> (Option<i64>, MatchStatus) {
    let key = normalize(scraped_name);
    if key.is_empty() {
        return (None, MatchStatus::Unmatched);
    }
    let splits = name_splits(&key);

    // Scoped pass: only riders affiliated with the matched team.
    if let Some(team_id) = team_id {
        let mut candidates = exact_rider_candidates(catalog, &key, Some(team_id), claimed);
        if candidates.is_empty() {
            candidates = fuzzy_rider_candidates(
                catalog.riders_on_team(team_id),
                splits.as_ref(),
                config.fuzzy_threshold,
                claimed,
            );
        }
        if let Some((id, status)) = pick_candidate(candidates) {
            return (Some(id), status);
        }
    }

    // Catalog-wide fallback.
    let mut candidates = exact_rider_candidates(catalog, &key, None, claimed);
    if candidates.is_empty() {
        candidates = fuzzy_rider_candidates(
            catalog.riders().iter(),
            splits.as_ref(),
            config.fuzzy_threshold,
            claimed,
        );
    }
    match pick_candidate(candidates) {
        Some((id, status)) => (Some(id), status),
        None => (None, MatchStatus::Unmatched),
    }
}

/// Match a parsed roster against a catalog snapshot. Pure with respect to
/// both inputs; emits one `RecordMatched` event per team and rider in
/// document order.
pub fn match_roster(
    roster: &Roster,
    catalog: &Catalog,
    config: &MatchingConfig,
    layout: Layout,
    sink: &dyn EventSink,
) -> MatchReport {
    let mut claimed: HashSet<i64> = HashSet::new();
    let mut teams = Vec::with_capacity(roster.teams.len());

    for team in &roster.teams {
        let (team_id, team_status) = match_team(&team.name, catalog, config);
        sink.emit(RunEvent::RecordMatched {
            kind: RecordKind::Team,
            name: team.name.clone(),
            status: team_status,
        });

        let mut riders = Vec::with_capacity(team.riders.len());
        for rider in &team.riders {
            let (rider_id, rider_status) =
                match_rider(&rider.name, team_id, catalog, config, &claimed);
            if let Some(id) = rider_id {
                claimed.insert(id);
            }
            sink.emit(RunEvent::RecordMatched {
                kind: RecordKind::Rider,
                name: rider.name.clone(),
                status: rider_status,
            });
            riders.push(RiderMatch {
                scraped_name: rider.name.clone(),
                rider_id,
                matched_name: rider_id
                    .and_then(|id| catalog.rider(id))
                    .map(|r| r.display_name()),
                status: rider_status,
            });
        }

        teams.push(TeamMatch {
            scraped_name: team.name.clone(),
            team_id,
            matched_name: team_id
                .and_then(|id| catalog.team(id))
                .map(|t| t.name.clone()),
            status: team_status,
            riders,
        });
    }

    let summary = ReportSummary::from_teams(&teams);
    MatchReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            layout: layout.to_string(),
        },
        summary,
        teams,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::model::{ReferenceTeam, RosterRider, RosterTeam};

    fn team(id: i64, name: &str) -> ReferenceTeam {
        ReferenceTeam {
            id,
            name: name.into(),
            short_name: None,
        }
    }

    fn rider(id: i64, first: &str, last: &str, team_id: i64) -> ReferenceRider {
        ReferenceRider {
            id,
            first_name: first.into(),
            last_name: last.into(),
            team_id: Some(team_id),
        }
    }

    fn roster_of(teams: &[(&str, &[&str])]) -> Roster {
        Roster {
            teams: teams
                .iter()
                .map(|(name, riders)| RosterTeam {
                    name: name.to_string(),
                    riders: riders.iter().map(|r| RosterRider::named(*r)).collect(),
                })
                .collect(),
        }
    }

    fn config() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn scenario_a_full_match_with_extra_catalog_rider() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![
                rider(101, "J.", "Smith", 10),
                rider(102, "A.", "Jones", 10),
                rider(103, "B.", "Lee", 10),
            ],
        );
        let roster = roster_of(&[("Team Alpha", &["J. Smith", "A. Jones"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        assert_eq!(report.teams[0].team_id, Some(10));
        assert_eq!(report.teams[0].status, MatchStatus::Matched);
        assert_eq!(report.resolved_rider_ids(), vec![101, 102]);
        assert_eq!(report.summary.riders_matched, 2);
        assert_eq!(report.summary.riders_unmatched, 0);
    }

    #[test]
    fn scenario_b_fuzzy_rider_within_threshold() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(101, "J.", "Smith", 10)],
        );
        let roster = roster_of(&[("Team Alpha", &["J. Smyth", "Q. Xanthopoulos"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        let riders = &report.teams[0].riders;
        assert_eq!(riders[0].rider_id, Some(101));
        assert_eq!(riders[0].status, MatchStatus::Matched);
        assert_eq!(riders[1].rider_id, None);
        assert_eq!(riders[1].status, MatchStatus::Unmatched);
    }

    #[test]
    fn scenario_c_scoped_lookup_disambiguates_same_named_riders() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha"), team(20, "Bravo Racing")],
            vec![rider(101, "J.", "Smith", 10), rider(201, "J.", "Smith", 20)],
        );
        let roster = roster_of(&[("Bravo Racing", &["J. Smith"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        assert_eq!(report.teams[0].team_id, Some(20));
        assert_eq!(report.teams[0].riders[0].rider_id, Some(201));
        assert_eq!(report.teams[0].riders[0].status, MatchStatus::Matched);
    }

    #[test]
    fn scoped_miss_falls_back_to_catalog_wide() {
        // Rider listed under Alpha in the document but affiliated with
        // Bravo in the catalog.
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha"), team(20, "Bravo Racing")],
            vec![rider(201, "J.", "Smith", 20)],
        );
        let roster = roster_of(&[("Team Alpha", &["J. Smith"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        assert_eq!(report.teams[0].riders[0].rider_id, Some(201));
        assert_eq!(report.teams[0].riders[0].status, MatchStatus::Matched);
    }

    #[test]
    fn exact_match_beats_fuzzy_and_is_not_ambiguous() {
        // "Team Alpha" matches team 10 exactly and team 30 only fuzzily.
        let catalog = Catalog::new(
            vec![team(30, "Alpha Racing"), team(10, "Team Alpha")],
            vec![],
        );
        let (id, status) = match_team("Team Alpha", &catalog, &config());
        assert_eq!(id, Some(10));
        assert_eq!(status, MatchStatus::Matched);
    }

    #[test]
    fn two_exact_candidates_are_ambiguous_lowest_id_wins() {
        let catalog = Catalog::new(
            vec![team(42, "Team Alpha"), team(7, "TEAM ALPHA")],
            vec![],
        );
        let (id, status) = match_team("team alpha", &catalog, &config());
        assert_eq!(id, Some(7));
        assert_eq!(status, MatchStatus::Ambiguous);
    }

    #[test]
    fn unmatched_team_leaves_riders_unscoped() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(101, "J.", "Smith", 10)],
        );
        let roster = roster_of(&[("Completely Unknown Squad", &["J. Smith"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        assert_eq!(report.teams[0].team_id, None);
        assert_eq!(report.teams[0].status, MatchStatus::Unmatched);
        // rider still resolves through the catalog-wide pass
        assert_eq!(report.teams[0].riders[0].rider_id, Some(101));
    }

    #[test]
    fn rider_id_never_resolves_twice() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(101, "J.", "Smith", 10)],
        );
        let roster = roster_of(&[("Team Alpha", &["J. Smith", "J. Smith"])]);
        let report = match_roster(&roster, &catalog, &config(), Layout::GenericList, &NullSink);

        let riders = &report.teams[0].riders;
        assert_eq!(riders[0].rider_id, Some(101));
        assert_eq!(riders[1].rider_id, None);
        assert_eq!(riders[1].status, MatchStatus::Unmatched);
        assert_eq!(report.resolved_rider_ids(), vec![101]);
    }

    #[test]
    fn two_exact_rider_candidates_on_one_team_are_ambiguous() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(102, "J.", "Smith", 10), rider(101, "J.", "Smith", 10)],
        );
        let (id, status) =
            match_rider("J. Smith", Some(10), &catalog, &config(), &HashSet::new());
        assert_eq!(id, Some(101));
        assert_eq!(status, MatchStatus::Ambiguous);
    }

    #[test]
    fn reversed_name_order_still_exact() {
        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(101, "Tadej", "Primozic", 10)],
        );
        let (id, status) = match_rider("Primozic Tadej", Some(10), &catalog, &config(), &HashSet::new());
        assert_eq!(id, Some(101));
        assert_eq!(status, MatchStatus::Matched);
    }

    #[test]
    fn events_follow_document_order() {
        use std::sync::mpsc;

        let catalog = Catalog::new(
            vec![team(10, "Team Alpha")],
            vec![rider(101, "J.", "Smith", 10)],
        );
        let roster = roster_of(&[("Team Alpha", &["J. Smith", "Nobody Known"])]);
        let (tx, rx) = mpsc::channel();
        match_roster(&roster, &catalog, &config(), Layout::GenericList, &tx);
        drop(tx);

        let events: Vec<RunEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                RunEvent::RecordMatched {
                    kind: RecordKind::Team,
                    name: "Team Alpha".into(),
                    status: MatchStatus::Matched,
                },
                RunEvent::RecordMatched {
                    kind: RecordKind::Rider,
                    name: "J. Smith".into(),
                    status: MatchStatus::Matched,
                },
                RunEvent::RecordMatched {
                    kind: RecordKind::Rider,
                    name: "Nobody Known".into(),
                    status: MatchStatus::Unmatched,
                },
            ]
        );
    }
}
