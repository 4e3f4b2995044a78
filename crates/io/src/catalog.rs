//! Reference catalog loading from the two supported sources: a SQLite
//! database (converted game file) or a folder of CSV table exports.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use velostart_engine::{Catalog, EngineError, ReferenceRider, ReferenceTeam};

const TEAM_CSV: &str = "DYN_team.csv";
const RIDER_CSV: &str = "DYN_cyclist.csv";

/// Load teams and riders from `DYN_team` / `DYN_cyclist` in a SQLite file.
/// The database is opened read-only.
pub fn load_catalog_sqlite(path: &Path) -> Result<Catalog, EngineError> {
    if !path.is_file() {
        return Err(EngineError::CatalogLoad(format!(
            "database not found: {}",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| EngineError::CatalogLoad(e.to_string()))?;

    let teams = load_teams_sqlite(&conn)?;
    let riders = load_riders_sqlite(&conn)?;
    Ok(Catalog::new(teams, riders))
}

fn load_teams_sqlite(conn: &Connection) -> Result<Vec<ReferenceTeam>, EngineError> {
    let mut stmt = conn
        .prepare("SELECT IDteam, gene_sz_name, gene_sz_shortname FROM DYN_team")
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_team: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ReferenceTeam {
                id: row.get(0)?,
                name: row.get(1)?,
                short_name: row.get(2)?,
            })
        })
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_team: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_team: {e}")))
}

fn load_riders_sqlite(conn: &Connection) -> Result<Vec<ReferenceRider>, EngineError> {
    let mut stmt = conn
        .prepare("SELECT IDcyclist, gene_sz_firstname, gene_sz_lastname, fkIDteam FROM DYN_cyclist")
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_cyclist: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ReferenceRider {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                team_id: row.get(3)?,
            })
        })
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_cyclist: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| EngineError::CatalogLoad(format!("DYN_cyclist: {e}")))
}

/// Load teams and riders from `DYN_team.csv` / `DYN_cyclist.csv` table
/// exports in `dir`. Columns are located by header name, not position.
pub fn load_catalog_csv(dir: &Path) -> Result<Catalog, EngineError> {
    let teams = load_teams_csv(&dir.join(TEAM_CSV))?;
    let riders = load_riders_csv(&dir.join(RIDER_CSV))?;
    Ok(Catalog::new(teams, riders))
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, EngineError> {
    csv::Reader::from_path(path).map_err(|e| {
        EngineError::CatalogLoad(format!("{}: {e}", path.display()))
    })
}

fn column(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize, EngineError> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        EngineError::CatalogLoad(format!("{}: missing column {name}", path.display()))
    })
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn parse_id(value: &str, column: &str, path: &Path) -> Result<i64, EngineError> {
    value.parse().map_err(|_| {
        EngineError::CatalogLoad(format!(
            "{}: bad {column} value {value:?}",
            path.display()
        ))
    })
}

fn load_teams_csv(path: &Path) -> Result<Vec<ReferenceTeam>, EngineError> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| EngineError::CatalogLoad(format!("{}: {e}", path.display())))?
        .clone();
    let id_col = column(&headers, "IDteam", path)?;
    let name_col = column(&headers, "gene_sz_name", path)?;
    let short_col = headers.iter().position(|h| h == "gene_sz_shortname");

    let mut teams = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| EngineError::CatalogLoad(format!("{}: {e}", path.display())))?;
        teams.push(ReferenceTeam {
            id: parse_id(field(&record, id_col), "IDteam", path)?,
            name: field(&record, name_col).to_string(),
            short_name: short_col
                .map(|c| field(&record, c))
                .filter(|s| !s.is_empty())
                .map(String::from),
        });
    }
    Ok(teams)
}

fn load_riders_csv(path: &Path) -> Result<Vec<ReferenceRider>, EngineError> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| EngineError::CatalogLoad(format!("{}: {e}", path.display())))?
        .clone();
    let id_col = column(&headers, "IDcyclist", path)?;
    let first_col = column(&headers, "gene_sz_firstname", path)?;
    let last_col = column(&headers, "gene_sz_lastname", path)?;
    let team_col = column(&headers, "fkIDteam", path)?;

    let mut riders = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| EngineError::CatalogLoad(format!("{}: {e}", path.display())))?;
        let team_field = field(&record, team_col);
        riders.push(ReferenceRider {
            id: parse_id(field(&record, id_col), "IDcyclist", path)?,
            first_name: field(&record, first_col).to_string(),
            last_name: field(&record, last_col).to_string(),
            team_id: if team_field.is_empty() {
                None
            } else {
                Some(parse_id(team_field, "fkIDteam", path)?)
            },
        });
    }
    Ok(riders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv_catalog(dir: &Path) {
        fs::write(
            dir.join(TEAM_CSV),
            "IDteam,gene_sz_name,gene_sz_shortname\n10,Team Alpha,ALP\n20,Bravo Racing,\n",
        )
        .unwrap();
        fs::write(
            dir.join(RIDER_CSV),
            "IDcyclist,gene_sz_firstname,gene_sz_lastname,fkIDteam\n\
             101,Jan,Smith,10\n102,Anna,Jones,10\n300,Free,Agent,\n",
        )
        .unwrap();
    }

    #[test]
    fn csv_catalog_loads_with_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_catalog(dir.path());

        let catalog = load_catalog_csv(dir.path()).unwrap();
        assert_eq!(catalog.team_count(), 2);
        assert_eq!(catalog.rider_count(), 3);
        assert_eq!(catalog.team(10).unwrap().short_name.as_deref(), Some("ALP"));
        assert_eq!(catalog.team(20).unwrap().short_name, None);
        assert_eq!(catalog.rider(300).unwrap().team_id, None);
    }

    #[test]
    fn csv_missing_file_is_catalog_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog_csv(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::CatalogLoad(_)));
        assert!(err.to_string().contains(TEAM_CSV));
    }

    #[test]
    fn csv_missing_column_is_catalog_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TEAM_CSV), "IDteam,wrong_header\n10,x\n").unwrap();
        let err = load_catalog_csv(dir.path()).unwrap_err();
        assert!(err.to_string().contains("gene_sz_name"));
    }

    #[test]
    fn sqlite_catalog_loads() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("game.sqlite");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE DYN_team (IDteam INTEGER, gene_sz_name TEXT, gene_sz_shortname TEXT);
             CREATE TABLE DYN_cyclist (IDcyclist INTEGER, gene_sz_firstname TEXT,
                                       gene_sz_lastname TEXT, fkIDteam INTEGER);
             INSERT INTO DYN_team VALUES (10, 'Team Alpha', 'ALP');
             INSERT INTO DYN_cyclist VALUES (101, 'Jan', 'Smith', 10);
             INSERT INTO DYN_cyclist VALUES (300, 'Free', 'Agent', NULL);",
        )
        .unwrap();
        drop(conn);

        let catalog = load_catalog_sqlite(&db).unwrap();
        assert_eq!(catalog.team_count(), 1);
        assert_eq!(catalog.rider_count(), 2);
        assert_eq!(catalog.rider(101).unwrap().team_id, Some(10));
        assert_eq!(catalog.rider(300).unwrap().team_id, None);
    }

    #[test]
    fn sqlite_missing_table_is_catalog_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("empty.sqlite");
        Connection::open(&db).unwrap();

        let err = load_catalog_sqlite(&db).unwrap_err();
        assert!(matches!(err, EngineError::CatalogLoad(_)));
        assert!(err.to_string().contains("DYN_team"));
    }

    #[test]
    fn sqlite_missing_file_is_catalog_load_error() {
        let err = load_catalog_sqlite(Path::new("/nonexistent/game.sqlite")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
