//! Startlist XML export.
//!
//! Output shape: `<startlist>` containing one `<team id name>` per team
//! with one `<cyclist id name/>` per rider. The unmatched policy is an
//! explicit parameter; `Placeholder` entries keep the scraped name and
//! carry no `id` attribute.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use velostart_engine::{EngineError, MatchReport, UnmatchedPolicy};

/// Write the matched startlist to `path`. Deterministic for a given
/// report; a partially-written file is removed on error.
pub fn write_startlist_xml(
    report: &MatchReport,
    path: &Path,
    policy: UnmatchedPolicy,
) -> Result<(), EngineError> {
    let buf = render(report, policy)?;
    if let Err(e) = fs::write(path, buf) {
        let _ = fs::remove_file(path);
        return Err(EngineError::Export(format!("{}: {e}", path.display())));
    }
    Ok(())
}

fn render(report: &MatchReport, policy: UnmatchedPolicy) -> Result<Vec<u8>, EngineError> {
    fn export_err(e: impl std::fmt::Display) -> EngineError {
        EngineError::Export(e.to_string())
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    writer
        .write_event(Event::Start(BytesStart::new("startlist")))
        .map_err(export_err)?;

    for team in &report.teams {
        if team.team_id.is_none() && policy == UnmatchedPolicy::Skip {
            continue;
        }
        let mut el = BytesStart::new("team");
        if let Some(id) = team.team_id {
            el.push_attribute(("id", id.to_string().as_str()));
        }
        let name = team.matched_name.as_deref().unwrap_or(&team.scraped_name);
        el.push_attribute(("name", name));
        writer.write_event(Event::Start(el)).map_err(export_err)?;

        for rider in &team.riders {
            if rider.rider_id.is_none() && policy == UnmatchedPolicy::Skip {
                continue;
            }
            let mut el = BytesStart::new("cyclist");
            if let Some(id) = rider.rider_id {
                el.push_attribute(("id", id.to_string().as_str()));
            }
            let name = rider.matched_name.as_deref().unwrap_or(&rider.scraped_name);
            el.push_attribute(("name", name));
            writer.write_event(Event::Empty(el)).map_err(export_err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("team")))
            .map_err(export_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("startlist")))
        .map_err(export_err)?;

    let mut buf = writer.into_inner();
    buf.push(b'\n');
    Ok(buf)
}
