//! SQLite-based completion history.
//!
//! Every finished workout is recorded once; the "times completed" counter
//! shown to the user is derived from this table.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::StageSequence;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: i64,
    /// Number of work stages in the program.
    pub cycles: u32,
    pub work_ms: u64,
    pub total_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub times_completed: u64,
    pub total_work_ms: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// SQLite database for completion storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/cadence/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("cadence.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS completions (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    cycles       INTEGER NOT NULL,
                    work_ms      INTEGER NOT NULL,
                    total_ms     INTEGER NOT NULL,
                    completed_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_completions_completed_at
                    ON completions(completed_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Record one finished run of `stages`.
    pub fn record_completion(&self, stages: &StageSequence) -> Result<CompletionRecord> {
        self.record_completion_at(stages, Utc::now())
    }

    pub fn record_completion_at(
        &self,
        stages: &StageSequence,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord> {
        let cycles = u32::try_from(stages.work_count()).unwrap_or(u32::MAX);
        let work_ms = stages.work_duration_ms();
        let total_ms = stages.total_duration_ms();

        self.conn.execute(
            "INSERT INTO completions (cycles, work_ms, total_ms, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                cycles,
                to_sql_ms(work_ms),
                to_sql_ms(total_ms),
                completed_at.to_rfc3339()
            ],
        )?;

        Ok(CompletionRecord {
            id: self.conn.last_insert_rowid(),
            cycles,
            work_ms,
            total_ms,
            completed_at,
        })
    }

    /// Most recent completions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, cycles, work_ms, total_ms, completed_at
             FROM completions ORDER BY completed_at DESC, id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            let completed_at: String = row.get(4)?;
            Ok(CompletionRecord {
                id: row.get(0)?,
                cycles: row.get(1)?,
                work_ms: from_sql_ms(row.get(2)?),
                total_ms: from_sql_ms(row.get(3)?),
                completed_at: parse_timestamp(&completed_at),
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<CompletionStats> {
        let (count, total_work, last): (i64, i64, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(work_ms), 0), MAX(completed_at) FROM completions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(CompletionStats {
            times_completed: u64::try_from(count).unwrap_or(0),
            total_work_ms: from_sql_ms(total_work),
            last_completed_at: last.as_deref().map(parse_timestamp),
        })
    }
}

fn to_sql_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

fn from_sql_ms(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::build_stages;
    use chrono::TimeZone;

    #[test]
    fn empty_stats() {
        let db = Database::open_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats, CompletionStats::default());
    }

    #[test]
    fn record_and_count() {
        let db = Database::open_memory().unwrap();
        let stages = build_stages(2);

        let first = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        let rec = db.record_completion_at(&stages, first).unwrap();
        assert_eq!(rec.cycles, 2);
        assert_eq!(rec.work_ms, 60_000);
        assert_eq!(rec.total_ms, 90_000);
        db.record_completion_at(&stages, second).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.times_completed, 2);
        assert_eq!(stats.total_work_ms, 120_000);
        assert_eq!(stats.last_completed_at, Some(second));

        let recent = db.recent(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].completed_at, second);
    }

    #[test]
    fn open_at_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.record_completion(&build_stages(1)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.stats().unwrap().times_completed, 1);
    }
}
