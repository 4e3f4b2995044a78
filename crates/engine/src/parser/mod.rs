//! Startlist extraction from saved HTML documents.
//!
//! Each supported page layout is a typed extraction strategy over the
//! parsed DOM. Auto-detection probes the site-specific layouts first and
//! falls back to the generic ones; a caller may also force a layout.
//! Extraction is pure and deterministic. Missing sub-fields degrade to
//! absent attributes; a document that yields zero teams is a parse error.

mod firstcycling;
mod generic;
mod procyclingstats;

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::error::EngineError;
use crate::model::Roster;

pub use firstcycling::FirstCycling;
pub use generic::{GenericList, GenericTable, TeamSections};
pub use procyclingstats::ProCyclingStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    FirstCycling,
    ProCyclingStats,
    GenericList,
    GenericTable,
    TeamSections,
}

impl Layout {
    /// Auto-detection probe order. Site-specific layouts carry stronger
    /// structural signals and go first.
    pub const ALL: [Layout; 5] = [
        Layout::FirstCycling,
        Layout::ProCyclingStats,
        Layout::GenericList,
        Layout::GenericTable,
        Layout::TeamSections,
    ];
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstCycling => write!(f, "firstcycling"),
            Self::ProCyclingStats => write!(f, "procyclingstats"),
            Self::GenericList => write!(f, "generic_list"),
            Self::GenericTable => write!(f, "generic_table"),
            Self::TeamSections => write!(f, "team_sections"),
        }
    }
}

/// One page-layout extraction strategy.
pub trait LayoutParser {
    /// Cheap structural probe: does the document look like this layout?
    fn detect(&self, doc: &Html) -> bool;

    /// Extract the roster. `None` when the document yields no teams.
    fn extract(&self, doc: &Html) -> Option<Roster>;
}

fn strategy(layout: Layout) -> &'static dyn LayoutParser {
    match layout {
        Layout::FirstCycling => &FirstCycling,
        Layout::ProCyclingStats => &ProCyclingStats,
        Layout::GenericList => &GenericList,
        Layout::GenericTable => &GenericTable,
        Layout::TeamSections => &TeamSections,
    }
}

/// Parse an HTML startlist into a roster. With `layout = None`, each
/// strategy is probed in [`Layout::ALL`] order and the first one that
/// yields teams wins.
pub fn parse_document(html: &str, layout: Option<Layout>) -> Result<(Roster, Layout), EngineError> {
    if html.trim().is_empty() {
        return Err(EngineError::Parse("empty document".into()));
    }
    let doc = Html::parse_document(html);

    if let Some(layout) = layout {
        let roster = strategy(layout).extract(&doc).ok_or_else(|| {
            EngineError::Parse(format!("no teams extracted with the {layout} layout"))
        })?;
        return Ok((roster, layout));
    }

    for layout in Layout::ALL {
        let parser = strategy(layout);
        if !parser.detect(&doc) {
            continue;
        }
        if let Some(roster) = parser.extract(&doc) {
            return Ok((roster, layout));
        }
    }
    Err(EngineError::Parse(
        "no known startlist layout detected".into(),
    ))
}

/// Parse a CSS selector. Selectors here are fixed strings, but the engine
/// still degrades instead of panicking.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Element text with whitespace collapsed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a leading bib number off a rider entry:
/// "12 J. Smith" -> (Some("12"), "J. Smith").
pub(crate) fn split_bib(text: &str) -> (Option<String>, String) {
    let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
    let rest = text[digits.len()..].trim_start().to_string();
    if digits.is_empty() {
        (None, rest)
    } else {
        (Some(digits), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_parse_error() {
        let err = parse_document("   \n  ", None).unwrap_err();
        assert!(err.to_string().contains("empty document"));
    }

    #[test]
    fn undetectable_document_is_a_parse_error() {
        let err = parse_document("<html><body><p>race news</p></body></html>", None).unwrap_err();
        assert!(err.to_string().contains("no known startlist layout"));
    }

    #[test]
    fn forced_layout_that_yields_nothing_is_a_parse_error() {
        let err = parse_document(
            "<html><body><p>race news</p></body></html>",
            Some(Layout::FirstCycling),
        )
        .unwrap_err();
        assert!(err.to_string().contains("firstcycling"));
    }

    #[test]
    fn split_bib_only_takes_leading_digits() {
        assert_eq!(split_bib("12 J. Smith"), (Some("12".into()), "J. Smith".into()));
        assert_eq!(split_bib("J. Smith 3rd"), (None, "J. Smith 3rd".into()));
        assert_eq!(split_bib("7"), (Some("7".into()), String::new()));
    }
}
