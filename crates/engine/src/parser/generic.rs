//! Fallback strategies for pages that are neither FirstCycling nor
//! ProCyclingStats: startlist-classed lists, plain tables with team
//! header rows, and team-classed div sections.

use scraper::{ElementRef, Html};

use super::{selector, split_bib, text_of, LayoutParser};
use crate::model::{Roster, RosterRider, RosterTeam};

fn roster_from(teams: Vec<RosterTeam>) -> Option<Roster> {
    if teams.is_empty() {
        None
    } else {
        Some(Roster { teams })
    }
}

// ---------------------------------------------------------------------------
// GenericList: <ul class="...startlist..."> per team, heading above
// ---------------------------------------------------------------------------

pub struct GenericList;

impl LayoutParser for GenericList {
    fn detect(&self, doc: &Html) -> bool {
        selector(r#"ul[class*="startlist"]"#)
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    fn extract(&self, doc: &Html) -> Option<Roster> {
        let list_sel = selector(r#"ul[class*="startlist"]"#)?;
        let item_sel = selector("li")?;

        let mut teams = Vec::new();
        for list in doc.select(&list_sel) {
            let name =
                preceding_heading(list).unwrap_or_else(|| String::from("Unknown Team"));

            let riders: Vec<RosterRider> = list
                .select(&item_sel)
                .filter_map(|li| {
                    let (position, name) = split_bib(&text_of(li));
                    (name.len() > 2).then_some(RosterRider {
                        name,
                        nationality: None,
                        position,
                    })
                })
                .collect();

            if !riders.is_empty() {
                teams.push(RosterTeam { name, riders });
            }
        }
        roster_from(teams)
    }
}

/// Nearest heading-like element before `start`: its previous sibling
/// elements first, then each ancestor's previous siblings.
fn preceding_heading(start: ElementRef<'_>) -> Option<String> {
    let preceding = start
        .prev_siblings()
        .chain(start.ancestors().flat_map(|a| a.prev_siblings()));
    for node in preceding {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if matches!(el.value().name(), "h3" | "h4" | "h5" | "div") {
            let text = text_of(el);
            if text.len() > 3 && text.len() < 100 {
                return Some(text);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// GenericTable: team header rows interleaved with rider rows
// ---------------------------------------------------------------------------

pub struct GenericTable;

impl LayoutParser for GenericTable {
    fn detect(&self, doc: &Html) -> bool {
        selector("table")
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    fn extract(&self, doc: &Html) -> Option<Roster> {
        let table_sel = selector("table")?;
        let row_sel = selector("tr")?;
        let cell_sel = selector("td, th")?;

        let mut teams = Vec::new();
        for table in doc.select(&table_sel) {
            let mut current: Option<RosterTeam> = None;

            for row in table.select(&row_sel) {
                let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
                if cells.is_empty() {
                    continue;
                }
                // A single cell, or any "team" marker in the row markup,
                // starts a new team section.
                let is_header =
                    cells.len() == 1 || row.html().to_lowercase().contains("team");
                if is_header {
                    push_team(&mut teams, current.take());
                    let name = text_of(cells[0]);
                    if !name.is_empty() {
                        current = Some(RosterTeam {
                            name,
                            riders: Vec::new(),
                        });
                    }
                } else if let Some(team) = current.as_mut() {
                    if let Some(rider) = rider_from_cells(&cells) {
                        team.riders.push(rider);
                    }
                }
            }
            push_team(&mut teams, current.take());
        }
        roster_from(teams)
    }
}

/// Read one rider row: an optional leading bib cell, the first plausible
/// cell as the name, and a later country-code cell as the nationality.
fn rider_from_cells(cells: &[ElementRef<'_>]) -> Option<RosterRider> {
    let mut position = None;
    let mut name: Option<String> = None;
    let mut nationality = None;

    for cell in cells {
        let text = text_of(*cell);
        if name.is_none() {
            let (bib, rest) = split_bib(&text);
            if rest.len() > 2 {
                position = position.or(bib);
                name = Some(rest);
            } else if bib.is_some() && rest.is_empty() {
                position = position.or(bib);
            }
        } else if nationality.is_none() && looks_like_country_code(&text) {
            nationality = Some(text);
        }
    }

    name.map(|name| RosterRider {
        name,
        nationality,
        position,
    })
}

fn looks_like_country_code(text: &str) -> bool {
    (2..=3).contains(&text.len()) && text.chars().all(|c| c.is_ascii_uppercase())
}

fn push_team(teams: &mut Vec<RosterTeam>, team: Option<RosterTeam>) {
    if let Some(team) = team {
        if !team.riders.is_empty() {
            teams.push(team);
        }
    }
}

// ---------------------------------------------------------------------------
// TeamSections: <div class="...team..."> with a header and rider links
// ---------------------------------------------------------------------------

pub struct TeamSections;

impl LayoutParser for TeamSections {
    fn detect(&self, doc: &Html) -> bool {
        selector(r#"div[class*="team"]"#)
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    fn extract(&self, doc: &Html) -> Option<Roster> {
        let section_sel = selector(r#"div[class*="team"]"#)?;
        let header_sel = selector("h3, h4, h5, strong")?;
        let rider_sel = selector(r#"a[href*="rider"]"#)?;

        let mut teams = Vec::new();
        for section in doc.select(&section_sel) {
            let Some(header) = section.select(&header_sel).next() else {
                continue;
            };
            let name = text_of(header);
            if name.is_empty() {
                continue;
            }

            let riders: Vec<RosterRider> = section
                .select(&rider_sel)
                .map(text_of)
                .filter(|n| !n.is_empty())
                .map(RosterRider::named)
                .collect();

            if !riders.is_empty() {
                teams.push(RosterTeam { name, riders });
            }
        }
        roster_from(teams)
    }
}
