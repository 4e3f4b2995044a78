//! In-memory reference catalog with normalized-name indices.

use std::collections::BTreeMap;

use crate::model::{ReferenceRider, ReferenceTeam};
use crate::normalize::normalize;

/// Read-only snapshot of teams and riders, indexed for name lookup.
/// Built fresh per run and never mutated by matching.
#[derive(Debug)]
pub struct Catalog {
    teams: Vec<ReferenceTeam>,
    riders: Vec<ReferenceRider>,
    team_index: BTreeMap<String, Vec<i64>>,
    rider_index: BTreeMap<String, Vec<i64>>,
    team_by_id: BTreeMap<i64, usize>,
    rider_by_id: BTreeMap<i64, usize>,
    team_rosters: BTreeMap<i64, Vec<i64>>,
}

impl Catalog {
    pub fn new(teams: Vec<ReferenceTeam>, riders: Vec<ReferenceRider>) -> Self {
        let mut team_index: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        let mut rider_index: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        let mut team_by_id = BTreeMap::new();
        let mut rider_by_id = BTreeMap::new();
        let mut team_rosters: BTreeMap<i64, Vec<i64>> = BTreeMap::new();

        for (i, team) in teams.iter().enumerate() {
            team_by_id.insert(team.id, i);
            for name in std::iter::once(team.name.as_str())
                .chain(team.short_name.as_deref())
            {
                let key = normalize(name);
                if !key.is_empty() {
                    team_index.entry(key).or_default().push(team.id);
                }
            }
        }

        for (i, rider) in riders.iter().enumerate() {
            rider_by_id.insert(rider.id, i);
            // Index both name orders; scraped pages disagree on which
            // comes first.
            let first = normalize(&rider.first_name);
            let last = normalize(&rider.last_name);
            for key in [format!("{first} {last}"), format!("{last} {first}")] {
                let key = key.trim().to_string();
                if !key.is_empty() {
                    rider_index.entry(key).or_default().push(rider.id);
                }
            }
            if let Some(team_id) = rider.team_id {
                team_rosters.entry(team_id).or_default().push(rider.id);
            }
        }

        // Sorted candidate lists keep the lowest-id tie-break deterministic.
        for ids in team_index.values_mut().chain(rider_index.values_mut()) {
            ids.sort_unstable();
            ids.dedup();
        }

        Self {
            teams,
            riders,
            team_index,
            rider_index,
            team_by_id,
            rider_by_id,
            team_rosters,
        }
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn rider_count(&self) -> usize {
        self.riders.len()
    }

    pub fn teams(&self) -> &[ReferenceTeam] {
        &self.teams
    }

    pub fn riders(&self) -> &[ReferenceRider] {
        &self.riders
    }

    pub fn team(&self, id: i64) -> Option<&ReferenceTeam> {
        self.team_by_id.get(&id).map(|&i| &self.teams[i])
    }

    pub fn rider(&self, id: i64) -> Option<&ReferenceRider> {
        self.rider_by_id.get(&id).map(|&i| &self.riders[i])
    }

    /// Team ids whose name or short name normalizes to `key`.
    pub fn teams_by_name(&self, key: &str) -> &[i64] {
        self.team_index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rider ids whose full name, in either order, normalizes to `key`.
    pub fn riders_by_name(&self, key: &str) -> &[i64] {
        self.rider_index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Riders currently affiliated with `team_id`.
    pub fn riders_on_team(&self, team_id: i64) -> impl Iterator<Item = &ReferenceRider> {
        self.team_rosters
            .get(&team_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.rider(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, name: &str, short: Option<&str>) -> ReferenceTeam {
        ReferenceTeam {
            id,
            name: name.into(),
            short_name: short.map(Into::into),
        }
    }

    fn rider(id: i64, first: &str, last: &str, team_id: Option<i64>) -> ReferenceRider {
        ReferenceRider {
            id,
            first_name: first.into(),
            last_name: last.into(),
            team_id,
        }
    }

    fn sample() -> Catalog {
        Catalog::new(
            vec![
                team(10, "Team Alpha", Some("ALP")),
                team(20, "Bravo Racing", None),
            ],
            vec![
                rider(101, "J.", "Smith", Some(10)),
                rider(102, "A.", "Jones", Some(10)),
                rider(201, "J.", "Smith", Some(20)),
                rider(300, "Free", "Agent", None),
            ],
        )
    }

    #[test]
    fn team_lookup_by_name_and_short_name() {
        let catalog = sample();
        assert_eq!(catalog.teams_by_name("team alpha"), &[10]);
        assert_eq!(catalog.teams_by_name("alp"), &[10]);
        assert!(catalog.teams_by_name("nonexistent").is_empty());
    }

    #[test]
    fn rider_index_keeps_all_same_named_candidates_sorted() {
        let catalog = sample();
        assert_eq!(catalog.riders_by_name("j smith"), &[101, 201]);
        assert_eq!(catalog.riders_by_name("smith j"), &[101, 201]);
    }

    #[test]
    fn roster_scoping() {
        let catalog = sample();
        let on_10: Vec<i64> = catalog.riders_on_team(10).map(|r| r.id).collect();
        assert_eq!(on_10, vec![101, 102]);
        assert_eq!(catalog.riders_on_team(99).count(), 0);
    }

    #[test]
    fn id_lookups() {
        let catalog = sample();
        assert_eq!(catalog.team(20).unwrap().name, "Bravo Racing");
        assert_eq!(catalog.rider(300).unwrap().team_id, None);
        assert!(catalog.rider(9999).is_none());
    }
}
