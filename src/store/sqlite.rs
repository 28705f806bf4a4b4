//! SQLite-backed [`AlertStore`] over the scoring pipeline's alert database.
//!
//! The database belongs to the external writer: this module never creates the
//! file, the table, or changes journal settings. Statement text for the
//! dashboard queries is fixed so the store sees exactly the queries the
//! pipeline tooling expects.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use super::{AlertRecord, AlertStore, ClearOutcome, FeedLimit};
use crate::core::errors::{Result, VesperError};

pub const COUNT_SQL: &str = "SELECT COUNT(*) as count FROM high_risk_flows";
pub const MAX_SCORE_SQL: &str = "SELECT MAX(score) as max_score FROM high_risk_flows";
pub const PREVIEW_SQL: &str = "SELECT * FROM high_risk_flows ORDER BY timestamp DESC LIMIT 10";
pub const HISTORY_SQL: &str = "SELECT * FROM high_risk_flows ORDER BY timestamp DESC LIMIT 50";
pub const DELETE_ALL_SQL: &str = "DELETE FROM high_risk_flows";
pub const RESET_SEQUENCE_SQL: &str = "DELETE FROM sqlite_sequence WHERE name='high_risk_flows'";

const AVG_SCORE_SQL: &str = "SELECT AVG(score) as avg_score FROM high_risk_flows";
const FIND_BY_ID_SQL: &str = "SELECT * FROM high_risk_flows WHERE id = ?1";
const HAS_SEQUENCE_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence')";

/// Connection to the alert database.
pub struct SqliteAlertStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteAlertStore {
    /// Open the existing database at `path`.
    ///
    /// A missing or unreadable file is a [`VesperError::Connection`]; the
    /// caller decides whether to run disconnected.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| connection_error(path, &e))?;

        conn.busy_timeout(busy_timeout)
            .map_err(|e| connection_error(path, &e))?;

        // Opening is lazy; touch the schema so a non-database file fails here.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| connection_error(path, &e))?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mean score across all rows, `None` when empty.
    pub fn avg_score(&self) -> Result<Option<f64>> {
        self.conn
            .query_row(AVG_SCORE_SQL, [], |row| row.get::<_, Option<f64>>("avg_score"))
            .map_err(|e| VesperError::query("avg_score", e))
    }

    /// Look up one record by primary key.
    pub fn find_by_id(&self, id: i64) -> Result<Option<AlertRecord>> {
        self.conn
            .prepare_cached(FIND_BY_ID_SQL)
            .and_then(|mut stmt| stmt.query_row(params![id], alert_from_row).optional())
            .map_err(|e| VesperError::query("find_by_id", e))
    }

    /// Round-trip a trivial statement to prove the store answers.
    pub fn health_check(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| VesperError::query("health_check", e))
    }

    fn has_sequence_table(conn: &Connection) -> rusqlite::Result<bool> {
        conn.query_row(HAS_SEQUENCE_SQL, [], |row| row.get(0))
    }
}

impl AlertStore for SqliteAlertStore {
    fn count_all(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(COUNT_SQL, [], |row| row.get("count"))
            .map_err(|e| VesperError::query("count_all", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn max_score(&self) -> Result<Option<f64>> {
        self.conn
            .query_row(MAX_SCORE_SQL, [], |row| row.get::<_, Option<f64>>("max_score"))
            .map_err(|e| VesperError::query("max_score", e))
    }

    fn list_latest(&self, limit: FeedLimit) -> Result<Vec<AlertRecord>> {
        let sql = match limit {
            FeedLimit::Preview => PREVIEW_SQL,
            FeedLimit::History => HISTORY_SQL,
        };
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| VesperError::query("list_latest", e))?;
        let rows = stmt
            .query_map([], alert_from_row)
            .map_err(|e| VesperError::query("list_latest", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| VesperError::query("list_latest", e))?;
        Ok(rows)
    }

    fn clear_all(&mut self) -> Result<ClearOutcome> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| VesperError::storage("clear_all", e))?;

        let deleted = tx
            .execute(DELETE_ALL_SQL, [])
            .map_err(|e| VesperError::storage("clear_all", e))?;

        // Tables without AUTOINCREMENT have no sequence row to reset.
        let sequence_reset =
            Self::has_sequence_table(&tx).map_err(|e| VesperError::storage("clear_all", e))?;
        if sequence_reset {
            tx.execute(RESET_SEQUENCE_SQL, [])
                .map_err(|e| VesperError::storage("clear_all", e))?;
        }

        tx.commit()
            .map_err(|e| VesperError::storage("clear_all", e))?;

        Ok(ClearOutcome {
            deleted,
            sequence_reset,
        })
    }
}

fn connection_error(path: &Path, err: &rusqlite::Error) -> VesperError {
    VesperError::Connection {
        path: path.to_path_buf(),
        details: err.to_string(),
    }
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<AlertRecord> {
    Ok(AlertRecord {
        id: row.get("id")?,
        src_ip: row.get("src_ip")?,
        dst_ip: row.get("dst_ip")?,
        src_port: row.get("src_port")?,
        dst_port: row.get("dst_port")?,
        proto: row.get("proto")?,
        score: row.get("score")?,
        timestamp: row.get("timestamp")?,
    })
}
