// velostart CLI - startlist matching and database mutation
// Parses saved startlist HTML, matches it against a game database, and
// either writes a startlist XML or applies it to a database copy.

mod exit_codes;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

use velostart_engine::{
    parse_document, CancelToken, EngineConfig, EngineError, EventSink, Layout, MatchReport,
    RecordKind, RunEvent, UnmatchedPolicy,
};
use velostart_io::convert::DEFAULT_TOOL_PATH;
use velostart_io::{run_apply, run_export, ApplyRun, CatalogSource, ExportRun};

use exit_codes::{error_exit_code, EXIT_SUCCESS, EXIT_UNMATCHED, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "velostart")]
#[command(about = "Startlist matching and mutation tools for cycling-manager game databases")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress per-record progress on stderr
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a startlist against a catalog and write a startlist XML
    #[command(group(ArgGroup::new("catalog").required(true).args(["db", "csv_dir"])))]
    #[command(after_help = "\
Examples:
  velostart export startlist.html --db game.sqlite -o startlist.xml
  velostart export startlist.html --csv-dir tables/ -o startlist.xml --unmatched placeholder
  velostart export startlist.html --db game.sqlite -o startlist.xml --json > report.json")]
    Export {
        /// Saved startlist HTML page
        html: PathBuf,

        /// Catalog source: SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Catalog source: folder with DYN_team.csv / DYN_cyclist.csv
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Output XML file
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// How unmatched records appear in the XML (overrides config)
        #[arg(long)]
        unmatched: Option<UnmatchedArg>,

        /// Force a page layout instead of auto-detection
        #[arg(long)]
        layout: Option<LayoutArg>,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full match report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Apply a startlist to a copy of the database: riders on startlist
    /// teams who are not on the startlist move to the reserve team
    #[command(after_help = "\
Examples:
  velostart apply startlist.html game.sqlite -o modified.sqlite
  velostart apply startlist.html game.cdb -o modified.cdb --tool tools/SQLiteExporter.exe")]
    Apply {
        /// Saved startlist HTML page
        html: PathBuf,

        /// Source database (.cdb or .sqlite); never modified
        database: PathBuf,

        /// Destination database (.cdb or .sqlite)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Path to the SQLiteExporter converter (for .cdb files)
        #[arg(long, default_value = DEFAULT_TOOL_PATH)]
        tool: PathBuf,

        /// Force a page layout instead of auto-detection
        #[arg(long)]
        layout: Option<LayoutArg>,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full match report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse a startlist and print the extracted roster as JSON
    Inspect {
        /// Saved startlist HTML page
        html: PathBuf,

        /// Force a page layout instead of auto-detection
        #[arg(long)]
        layout: Option<LayoutArg>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Firstcycling,
    Procyclingstats,
    GenericList,
    GenericTable,
    TeamSections,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Firstcycling => Layout::FirstCycling,
            LayoutArg::Procyclingstats => Layout::ProCyclingStats,
            LayoutArg::GenericList => Layout::GenericList,
            LayoutArg::GenericTable => Layout::GenericTable,
            LayoutArg::TeamSections => Layout::TeamSections,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnmatchedArg {
    Skip,
    Placeholder,
}

impl From<UnmatchedArg> for UnmatchedPolicy {
    fn from(arg: UnmatchedArg) -> Self {
        match arg {
            UnmatchedArg::Skip => UnmatchedPolicy::Skip,
            UnmatchedArg::Placeholder => UnmatchedPolicy::Placeholder,
        }
    }
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: message.into(),
            hint: None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let hint = match &err {
            EngineError::Conversion(_) => {
                Some("check --tool points at the SQLiteExporter executable".to_string())
            }
            EngineError::Parse(_) => {
                Some("try forcing a layout with --layout".to_string())
            }
            _ => None,
        };
        Self {
            code: error_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

/// Human progress printer. Stage and record events go to stderr so stdout
/// stays clean for JSON output.
struct StderrSink;

impl EventSink for StderrSink {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::StageStarted { stage } => eprintln!("==> {stage}"),
            RunEvent::RecordMatched { kind, name, status } => {
                let kind = match kind {
                    RecordKind::Team => "team ",
                    RecordKind::Rider => "rider",
                };
                eprintln!("    [{kind}] {name}: {status}");
            }
            RunEvent::StageCompleted { .. } => {}
            RunEvent::RunFailed { error } => eprintln!("run failed: {error}"),
        }
    }
}

/// Progress printer for --quiet: stages only.
struct QuietSink;

impl EventSink for QuietSink {
    fn emit(&self, event: RunEvent) {
        if let RunEvent::RunFailed { error } = event {
            eprintln!("run failed: {error}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let sink: &dyn EventSink = if cli.quiet { &QuietSink } else { &StderrSink };

    match dispatch(cli.command, sink) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}

fn dispatch(command: Commands, sink: &dyn EventSink) -> Result<u8, CliError> {
    match command {
        Commands::Export {
            html,
            db,
            csv_dir,
            output,
            unmatched,
            layout,
            config,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(policy) = unmatched {
                config.export.unmatched = policy.into();
            }
            let catalog = match (db, csv_dir) {
                (Some(path), None) => CatalogSource::Sqlite(path),
                (None, Some(dir)) => CatalogSource::CsvDir(dir),
                _ => return Err(CliError::usage("provide exactly one of --db or --csv-dir")),
            };

            let run = ExportRun {
                html_path: html,
                catalog,
                output_path: output.clone(),
                layout: layout.map(Into::into),
            };
            let report = run_export(&run, &config, sink, &CancelToken::new())?;

            print_summary(&report);
            eprintln!("wrote {}", output.display());
            if json {
                print_json(&report)?;
            }

            if report.summary.unmatched() > 0 {
                Ok(EXIT_UNMATCHED)
            } else {
                Ok(EXIT_SUCCESS)
            }
        }

        Commands::Apply {
            html,
            database,
            output,
            tool,
            layout,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let run = ApplyRun {
                html_path: html,
                database_path: database,
                output_path: output,
                layout: layout.map(Into::into),
                tool_path: tool,
            };
            let (report, outcome) = run_apply(&run, &config, sink, &CancelToken::new())?;

            print_summary(&report);
            eprintln!(
                "moved {} rider(s) to team {}, removed {} contract(s)",
                outcome.riders_moved, config.mutation.reserve_team_id, outcome.contracts_removed
            );
            eprintln!("wrote {}", outcome.output_path.display());
            if json {
                print_json(&report)?;
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Inspect { html, layout } => {
            let content = fs::read_to_string(&html)
                .map_err(|e| EngineError::Parse(format!("{}: {e}", html.display())))?;
            let (roster, layout) = parse_document(&content, layout.map(Into::into))?;

            let out = serde_json::json!({
                "layout": layout.to_string(),
                "teams": roster.teams,
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
            Ok(EXIT_SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("{}: {e}", path.display()),
        hint: None,
    })?;
    Ok(EngineConfig::from_toml(&content)?)
}

fn print_summary(report: &MatchReport) {
    let s = &report.summary;
    eprintln!(
        "teams: {}/{} matched ({} ambiguous), riders: {}/{} matched ({} ambiguous)",
        s.teams_matched + s.teams_ambiguous,
        s.teams_total,
        s.teams_ambiguous,
        s.riders_matched + s.riders_ambiguous,
        s.riders_total,
        s.riders_ambiguous,
    );
    for name in report.unmatched_rider_names() {
        eprintln!("unmatched rider: {name}");
    }
}

fn print_json(report: &MatchReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report).map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: format!("serializing report: {e}"),
        hint: None,
    })?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn layout_args_cover_every_engine_layout() {
        let mapped = [
            Layout::from(LayoutArg::Firstcycling),
            Layout::from(LayoutArg::Procyclingstats),
            Layout::from(LayoutArg::GenericList),
            Layout::from(LayoutArg::GenericTable),
            Layout::from(LayoutArg::TeamSections),
        ];
        assert_eq!(mapped, Layout::ALL);
    }

    #[test]
    fn config_flag_overrides_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velostart.toml");

        std::fs::write(&path, "[matching]\nfuzzy_threshold = 0.8\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.matching.fuzzy_threshold, 0.8);

        std::fs::write(&path, "[matching]\nfuzzy_threshold = 2.0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
