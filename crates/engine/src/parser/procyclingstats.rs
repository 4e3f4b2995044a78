//! ProCyclingStats startlist pages.
//!
//! Structure:
//! ```text
//! ul.startlist_v4 > li           one per team
//!     a.team                     team name, "(WT)" category suffix
//!     ul > li a[href*=/rider/]   riders as "LASTNAME Firstname"
//! ```

use scraper::Html;

use super::{selector, text_of, LayoutParser};
use crate::model::{Roster, RosterRider, RosterTeam};

pub struct ProCyclingStats;

impl LayoutParser for ProCyclingStats {
    fn detect(&self, doc: &Html) -> bool {
        selector("ul.startlist_v4")
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    fn extract(&self, doc: &Html) -> Option<Roster> {
        let team_sel = selector("ul.startlist_v4 > li")?;
        let name_sel = selector("a.team")?;
        let rider_sel = selector(r#"ul > li a[href*="/rider/"]"#)?;

        let mut teams = Vec::new();
        for team_li in doc.select(&team_sel) {
            let Some(name_link) = team_li.select(&name_sel).next() else {
                continue;
            };
            let name = strip_category(&text_of(name_link));
            if name.is_empty() {
                continue;
            }

            let riders: Vec<RosterRider> = team_li
                .select(&rider_sel)
                .map(|link| text_of(link))
                .filter(|raw| !raw.is_empty())
                .map(|raw| RosterRider::named(flip_surname_first(&raw)))
                .collect();

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

/// Drop the trailing division suffix: "Team Alpha (WT)" -> "Team Alpha".
fn strip_category(name: &str) -> String {
    let name = name.trim();
    match (name.ends_with(')'), name.rfind('(')) {
        (true, Some(open)) => name[..open].trim_end().to_string(),
        _ => name.to_string(),
    }
}

/// Convert "LASTNAME Firstname" to "Firstname LASTNAME". The surname is
/// rendered in all caps; the boundary is the first word with a lowercase
/// letter. Unsplittable names pass through unchanged.
fn flip_surname_first(raw: &str) -> String {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() < 2 {
        return raw.trim().to_string();
    }
    let boundary = parts.iter().position(|word| {
        word.chars()
            .any(|c| c.is_alphabetic() && c.is_lowercase())
    });
    match boundary {
        Some(i) if i > 0 => format!("{} {}", parts[i..].join(" "), parts[..i].join(" ")),
        _ => parts.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, Layout};

    const PAGE: &str = r#"
<html><body>
<ul class="startlist_v4">
  <li>
    <div class="ridersCont">
      <a class="team" href="/team/alpha">Team Alpha (WT)</a>
      <ul>
        <li><a href="/rider/jan-smith">SMITH Jan</a></li>
        <li><a href="/rider/an-van-der-berg">VAN DER BERG An</a></li>
      </ul>
    </div>
  </li>
  <li>
    <div class="ridersCont">
      <a class="team" href="/team/bravo">Bravo Racing (PRT)</a>
      <ul>
        <li><a href="/rider/carla-diaz">DIAZ Carla</a></li>
      </ul>
    </div>
  </li>
</ul>
</body></html>
"#;

    #[test]
    fn detects_and_strips_category_suffix() {
        let (roster, layout) = parse_document(PAGE, None).unwrap();
        assert_eq!(layout, Layout::ProCyclingStats);
        assert_eq!(roster.teams[0].name, "Team Alpha");
        assert_eq!(roster.teams[1].name, "Bravo Racing");
    }

    #[test]
    fn rider_names_flip_to_given_name_first() {
        let (roster, _) = parse_document(PAGE, Some(Layout::ProCyclingStats)).unwrap();
        assert_eq!(roster.teams[0].riders[0].name, "Jan SMITH");
        assert_eq!(roster.teams[0].riders[1].name, "An VAN DER BERG");
    }

    #[test]
    fn flip_handles_multi_word_surnames_and_odd_cases() {
        assert_eq!(flip_surname_first("SMITH Jan"), "Jan SMITH");
        assert_eq!(flip_surname_first("VAN DER BERG Jan Willem"), "Jan Willem VAN DER BERG");
        // No lowercase word, or lowercase first: leave as-is.
        assert_eq!(flip_surname_first("SMITH"), "SMITH");
        assert_eq!(flip_surname_first("ALL CAPS"), "ALL CAPS");
        assert_eq!(flip_surname_first("Jan Smith"), "Jan Smith");
    }

    #[test]
    fn strip_category_only_touches_trailing_parens() {
        assert_eq!(strip_category("Team Alpha (WT)"), "Team Alpha");
        assert_eq!(strip_category("Team (X) Alpha"), "Team (X) Alpha");
        assert_eq!(strip_category("Team Alpha"), "Team Alpha");
    }
}
