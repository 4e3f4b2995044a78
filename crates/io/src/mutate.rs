//! Non-destructive database mutation.
//!
//! The source database is never opened for writing. A private working
//! copy is mutated in one transaction: every rider whose team is on the
//! startlist but who is not on it himself moves to the reserve team, and
//! his contract rows are deleted. Riders on non-participating teams are
//! untouched. Any failure discards the working copy.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection, Transaction};
use velostart_engine::{EngineError, MatchReport};

/// SQLite bind-parameter headroom per INSERT batch.
const DB_CHUNK_SIZE: usize = 900;

#[derive(Debug)]
pub struct MutationOutcome {
    pub working_path: PathBuf,
    pub riders_moved: usize,
    pub contracts_removed: usize,
}

/// Copy `db_path` to `working_path` and apply the startlist there.
pub fn apply_startlist(
    report: &MatchReport,
    db_path: &Path,
    working_path: &Path,
    reserve_team_id: i64,
) -> Result<MutationOutcome, EngineError> {
    if working_path.exists() {
        fs::remove_file(working_path)
            .map_err(|e| EngineError::Mutation(format!("{}: {e}", working_path.display())))?;
    }
    fs::copy(db_path, working_path).map_err(|e| {
        EngineError::Mutation(format!(
            "copying {} to {}: {e}",
            db_path.display(),
            working_path.display()
        ))
    })?;

    match mutate_working_copy(report, working_path, reserve_team_id) {
        Ok((riders_moved, contracts_removed)) => Ok(MutationOutcome {
            working_path: working_path.to_path_buf(),
            riders_moved,
            contracts_removed,
        }),
        Err(e) => {
            let _ = fs::remove_file(working_path);
            Err(e)
        }
    }
}

fn mutate_working_copy(
    report: &MatchReport,
    working_path: &Path,
    reserve_team_id: i64,
) -> Result<(usize, usize), EngineError> {
    let mutation_err = |e: rusqlite::Error| EngineError::Mutation(e.to_string());

    let mut conn = Connection::open(working_path).map_err(mutation_err)?;
    let tx = conn.transaction().map_err(mutation_err)?;

    // The reserve team itself never counts as participating; otherwise a
    // startlist naming it would empty the whole pool.
    let team_ids: Vec<i64> = report
        .resolved_team_ids()
        .into_iter()
        .filter(|&id| id != reserve_team_id)
        .collect();
    let rider_ids = report.resolved_rider_ids();

    tx.execute_batch(
        "CREATE TEMP TABLE startlist_team (id INTEGER PRIMARY KEY);
         CREATE TEMP TABLE startlist_rider (id INTEGER PRIMARY KEY);",
    )
    .map_err(mutation_err)?;
    fill_temp_table(&tx, "startlist_team", &team_ids)?;
    fill_temp_table(&tx, "startlist_rider", &rider_ids)?;

    let riders_moved = tx
        .execute(
            "UPDATE DYN_cyclist SET fkIDteam = ?1
             WHERE fkIDteam IN (SELECT id FROM startlist_team)
               AND IDcyclist NOT IN (SELECT id FROM startlist_rider)",
            [reserve_team_id],
        )
        .map_err(mutation_err)?;

    let contracts_removed = tx
        .execute(
            "DELETE FROM DYN_contract_cyclist
             WHERE fkIDteam IN (SELECT id FROM startlist_team)
               AND fkIDcyclist NOT IN (SELECT id FROM startlist_rider)",
            [],
        )
        .map_err(mutation_err)?;

    tx.commit().map_err(mutation_err)?;
    Ok((riders_moved, contracts_removed))
}

/// Chunked multi-row inserts; id lists can exceed the bind-parameter cap.
fn fill_temp_table(tx: &Transaction<'_>, table: &str, ids: &[i64]) -> Result<(), EngineError> {
    for chunk in ids.chunks(DB_CHUNK_SIZE) {
        let placeholders = vec!["(?)"; chunk.len()].join(", ");
        let sql = format!("INSERT INTO {table} (id) VALUES {placeholders}");
        tx.execute(&sql, params_from_iter(chunk.iter()))
            .map_err(|e| EngineError::Mutation(e.to_string()))?;
    }
    Ok(())
}
