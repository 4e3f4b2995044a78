//! Wrapper around the external `SQLiteExporter` tool that converts the
//! game's proprietary CDB container to and from SQLite. Only the process
//! contract is wrapped; the container format itself stays opaque.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use velostart_engine::EngineError;

pub const DEFAULT_TOOL_PATH: &str = "SQLiteExporter/SQLiteExporter.exe";

pub struct Converter {
    tool_path: PathBuf,
}

impl Converter {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    fn run(&self, mode: &str, path: &Path) -> Result<(), EngineError> {
        let status = Command::new(&self.tool_path)
            .arg("-a")
            .arg(mode)
            .arg(path)
            .status()
            .map_err(|e| {
                EngineError::Conversion(format!("{}: {e}", self.tool_path.display()))
            })?;
        if !status.success() {
            return Err(EngineError::Conversion(format!(
                "{} {mode} {} exited with {status}",
                self.tool_path.display(),
                path.display()
            )));
        }
        Ok(())
    }

    /// Convert a `.cdb` file to SQLite. The tool drops the `.sqlite` file
    /// beside the input; it is moved to `sqlite_path`.
    pub fn export_to_sqlite(&self, cdb_path: &Path, sqlite_path: &Path) -> Result<(), EngineError> {
        self.run("-export", cdb_path)?;

        let produced = cdb_path.with_extension("sqlite");
        if !produced.is_file() {
            return Err(EngineError::Conversion(format!(
                "converter produced no output at {}",
                produced.display()
            )));
        }
        if sqlite_path.exists() {
            fs::remove_file(sqlite_path)
                .map_err(|e| EngineError::Conversion(format!("{}: {e}", sqlite_path.display())))?;
        }
        move_file(&produced, sqlite_path)
    }

    /// Repackage a SQLite database into `target_cdb`. The tool requires
    /// the `.sqlite` file beside the target and works on the common base
    /// path; the intermediate file is removed afterwards.
    pub fn import_from_sqlite(
        &self,
        sqlite_path: &Path,
        target_cdb: &Path,
    ) -> Result<(), EngineError> {
        let target_base = target_cdb.with_extension("");
        let staged = target_cdb.with_extension("sqlite");
        fs::copy(sqlite_path, &staged)
            .map_err(|e| EngineError::Conversion(format!("{}: {e}", staged.display())))?;

        let result = self.run("-import", &target_base);
        let _ = fs::remove_file(&staged);
        result
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_PATH)
    }
}

/// Rename, falling back to copy+delete for cross-device moves.
fn move_file(from: &Path, to: &Path) -> Result<(), EngineError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .map_err(|e| EngineError::Conversion(format!("{}: {e}", to.display())))?;
    fs::remove_file(from)
        .map_err(|e| EngineError::Conversion(format!("{}: {e}", from.display())))?;
    Ok(())
}
