//! FirstCycling startlist pages: one `table.tablesorter` per team, the
//! team name in the first `thead th`, riders as `rider.php` links.

use scraper::Html;

use super::{selector, text_of, LayoutParser};
use crate::model::{Roster, RosterRider, RosterTeam};

pub struct FirstCycling;

impl LayoutParser for FirstCycling {
    fn detect(&self, doc: &Html) -> bool {
        selector(r#"a[href*="firstcycling.com"]"#)
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    fn extract(&self, doc: &Html) -> Option<Roster> {
        let table_sel = selector("table.tablesorter")?;
        let th_sel = selector("thead th")?;
        let link_sel = selector("a")?;
        let row_sel = selector("tr")?;
        let rider_sel = selector(r#"a[href*="rider.php"]"#)?;

        let mut teams = Vec::new();
        for table in doc.select(&table_sel) {
            let Some(th) = table.select(&th_sel).next() else {
                continue;
            };
            // Prefer the link text; some headers wrap the name in an anchor.
            let name = th
                .select(&link_sel)
                .next()
                .map(text_of)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| text_of(th));
            if name.is_empty() {
                continue;
            }

            let mut riders = Vec::new();
            for row in table.select(&row_sel) {
                let Some(link) = row.select(&rider_sel).next() else {
                    continue;
                };
                // The title attribute carries the unabbreviated name.
                let rider_name = link
                    .value()
                    .attr("title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| text_of(link));
                if !rider_name.is_empty() {
                    riders.push(RosterRider::named(rider_name));
                }
            }

            if !riders.is_empty() {
                teams.push(RosterTeam { name, riders });
            }
        }

        if teams.is_empty() {
            None
        } else {
            Some(Roster { teams })
        }
    }
}
