//! Run orchestration: parse, load, match, then export or mutate.
//!
//! Stages run strictly in order. Stage events frame each step, the
//! cancel token is checked at stage boundaries only, and the first
//! fatal error ends the run verbatim. `.cdb` inputs and outputs
//! round-trip through the external converter; `.sqlite` paths skip it.

use std::fs;
use std::path::{Path, PathBuf};

use velostart_engine::{
    match_roster, parse_document, CancelToken, Catalog, EngineConfig, EngineError, EventSink,
    Layout, MatchReport, RunEvent, Stage,
};

use crate::catalog::{load_catalog_csv, load_catalog_sqlite};
use crate::convert::Converter;
use crate::mutate::apply_startlist;
use crate::xml::write_startlist_xml;

#[derive(Debug, Clone)]
pub enum CatalogSource {
    Sqlite(PathBuf),
    CsvDir(PathBuf),
}

impl CatalogSource {
    fn load(&self) -> Result<Catalog, EngineError> {
        match self {
            Self::Sqlite(path) => load_catalog_sqlite(path),
            Self::CsvDir(dir) => load_catalog_csv(dir),
        }
    }
}

/// Inputs for a startlist XML export run.
#[derive(Debug, Clone)]
pub struct ExportRun {
    pub html_path: PathBuf,
    pub catalog: CatalogSource,
    pub output_path: PathBuf,
    pub layout: Option<Layout>,
}

/// Inputs for a database mutation run.
#[derive(Debug, Clone)]
pub struct ApplyRun {
    pub html_path: PathBuf,
    /// Source database, `.cdb` or `.sqlite`. Never written to.
    pub database_path: PathBuf,
    /// Destination database, `.cdb` or `.sqlite`.
    pub output_path: PathBuf,
    pub layout: Option<Layout>,
    pub tool_path: PathBuf,
}

#[derive(Debug)]
pub struct ApplyOutcome {
    pub output_path: PathBuf,
    pub riders_moved: usize,
    pub contracts_removed: usize,
}

fn stage<T>(
    stage: Stage,
    sink: &dyn EventSink,
    cancel: &CancelToken,
    body: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled(stage));
    }
    sink.emit(RunEvent::StageStarted { stage });
    let out = body()?;
    sink.emit(RunEvent::StageCompleted { stage });
    Ok(out)
}

fn report_failure<T>(
    result: Result<T, EngineError>,
    sink: &dyn EventSink,
) -> Result<T, EngineError> {
    if let Err(e) = &result {
        if !matches!(e, EngineError::Cancelled(_)) {
            sink.emit(RunEvent::RunFailed {
                error: e.to_string(),
            });
        }
    }
    result
}

fn parse_stage(
    html_path: &Path,
    layout: Option<Layout>,
    sink: &dyn EventSink,
    cancel: &CancelToken,
) -> Result<(velostart_engine::Roster, Layout), EngineError> {
    stage(Stage::Parsing, sink, cancel, || {
        let html = fs::read_to_string(html_path)
            .map_err(|e| EngineError::Parse(format!("{}: {e}", html_path.display())))?;
        parse_document(&html, layout)
    })
}

/// Parse, match, and write the startlist XML. Returns the report even
/// when some records stayed unmatched; the caller decides what that
/// means.
pub fn run_export(
    run: &ExportRun,
    config: &EngineConfig,
    sink: &dyn EventSink,
    cancel: &CancelToken,
) -> Result<MatchReport, EngineError> {
    report_failure(export_inner(run, config, sink, cancel), sink)
}

fn export_inner(
    run: &ExportRun,
    config: &EngineConfig,
    sink: &dyn EventSink,
    cancel: &CancelToken,
) -> Result<MatchReport, EngineError> {
    let (roster, layout) = parse_stage(&run.html_path, run.layout, sink, cancel)?;

    let catalog = stage(Stage::LoadingCatalog, sink, cancel, || run.catalog.load())?;

    let report = stage(Stage::Matching, sink, cancel, || {
        Ok(match_roster(
            &roster,
            &catalog,
            &config.matching,
            layout,
            sink,
        ))
    })?;

    stage(Stage::Exporting, sink, cancel, || {
        write_startlist_xml(&report, &run.output_path, config.export.unmatched)
    })?;

    Ok(report)
}

/// Parse, match, and apply the startlist to a copy of the database.
pub fn run_apply(
    run: &ApplyRun,
    config: &EngineConfig,
    sink: &dyn EventSink,
    cancel: &CancelToken,
) -> Result<(MatchReport, ApplyOutcome), EngineError> {
    report_failure(apply_inner(run, config, sink, cancel), sink)
}

fn apply_inner(
    run: &ApplyRun,
    config: &EngineConfig,
    sink: &dyn EventSink,
    cancel: &CancelToken,
) -> Result<(MatchReport, ApplyOutcome), EngineError> {
    let (roster, layout) = parse_stage(&run.html_path, run.layout, sink, cancel)?;

    let converter = Converter::new(&run.tool_path);

    // A .cdb source is unpacked once; the unpacked SQLite file serves as
    // both the catalog and the mutation source.
    let unpacked = if is_cdb(&run.database_path) {
        let sqlite = run.output_path.with_extension("source.sqlite");
        Some(sqlite)
    } else {
        None
    };
    let source_sqlite = unpacked.as_deref().unwrap_or(&run.database_path);

    let result = apply_stages(
        run,
        config,
        sink,
        cancel,
        &converter,
        source_sqlite,
        unpacked.is_some(),
        &roster,
        layout,
    );
    if let Some(sqlite) = &unpacked {
        let _ = fs::remove_file(sqlite);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn apply_stages(
    run: &ApplyRun,
    config: &EngineConfig,
    sink: &dyn EventSink,
    cancel: &CancelToken,
    converter: &Converter,
    source_sqlite: &Path,
    needs_unpack: bool,
    roster: &velostart_engine::Roster,
    layout: Layout,
) -> Result<(MatchReport, ApplyOutcome), EngineError> {
    let catalog = stage(Stage::LoadingCatalog, sink, cancel, || {
        if needs_unpack {
            converter.export_to_sqlite(&run.database_path, source_sqlite)?;
        }
        load_catalog_sqlite(source_sqlite)
    })?;

    let report = stage(Stage::Matching, sink, cancel, || {
        Ok(match_roster(roster, &catalog, &config.matching, layout, sink))
    })?;

    let outcome = stage(Stage::Mutating, sink, cancel, || {
        if is_cdb(&run.output_path) {
            // Mutate a staging copy, then repackage it into the .cdb.
            let working = run.output_path.with_extension("working.sqlite");
            let outcome = apply_startlist(
                &report,
                source_sqlite,
                &working,
                config.mutation.reserve_team_id,
            )?;
            let repack = converter.import_from_sqlite(&outcome.working_path, &run.output_path);
            let _ = fs::remove_file(&outcome.working_path);
            repack?;
            Ok(ApplyOutcome {
                output_path: run.output_path.clone(),
                riders_moved: outcome.riders_moved,
                contracts_removed: outcome.contracts_removed,
            })
        } else {
            let outcome = apply_startlist(
                &report,
                source_sqlite,
                &run.output_path,
                config.mutation.reserve_team_id,
            )?;
            Ok(ApplyOutcome {
                output_path: outcome.working_path,
                riders_moved: outcome.riders_moved,
                contracts_removed: outcome.contracts_removed,
            })
        }
    })?;

    Ok((report, outcome))
}

fn is_cdb(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("cdb"))
        .unwrap_or(false)
}
