//! Violation persistence.
//!
//! The classifier produces results; this layer owns writing them down. One
//! `ViolationRecord` row per qualifying warning, plus a minimal session
//! table so records can be grouped per exam sitting.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OpenFlags};

use crate::detect::ViolationKind;

/// One persisted violation.
#[derive(Clone, Debug, PartialEq)]
pub struct ViolationRecord {
    pub session_id: String,
    pub kind: ViolationKind,
    pub description: String,
    pub screenshot_path: Option<String>,
    /// SHA-256 of the evidence file bytes, when a screenshot was written.
    pub screenshot_sha256: Option<[u8; 32]>,
    /// Seconds since epoch.
    pub detected_at: u64,
}

pub trait ViolationStore {
    /// Idempotently register a session.
    fn start_session(&mut self, session_id: &str, started_at: u64) -> Result<()>;

    /// Append one violation. Returns the row id.
    fn record_violation(&mut self, record: &ViolationRecord) -> Result<i64>;

    /// All violations for a session, oldest first.
    fn violations_for_session(&self, session_id: &str) -> Result<Vec<ViolationRecord>>;

    /// Number of violations of one kind within a session.
    fn count_by_kind(&self, session_id: &str, kind: ViolationKind) -> Result<u64>;
}

pub struct SqliteViolationStore {
    conn: Connection,
}

impl SqliteViolationStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = open_db_connection(db_path)?;
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS exam_sessions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              session_id TEXT UNIQUE NOT NULL,
              started_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS violations (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              session_id TEXT NOT NULL,
              violation_type TEXT NOT NULL,
              description TEXT NOT NULL,
              screenshot_path TEXT,
              screenshot_sha256 BLOB,
              detected_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_violations_session ON violations(session_id);
            CREATE INDEX IF NOT EXISTS idx_violations_detected ON violations(detected_at);
            "#,
        )?;
        Ok(())
    }
}

pub(crate) fn open_db_connection(db_path: &str) -> Result<Connection> {
    if db_path.starts_with("file:") {
        return Ok(Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?);
    }
    Ok(Connection::open(db_path)?)
}

fn blob32(bytes: Vec<u8>, what: &str) -> Result<[u8; 32]> {
    if bytes.len() != 32 {
        return Err(anyhow!("corrupt {}: expected 32 bytes, got {}", what, bytes.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

impl ViolationStore for SqliteViolationStore {
    fn start_session(&mut self, session_id: &str, started_at: u64) -> Result<()> {
        crate::validate_session_id(session_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO exam_sessions (session_id, started_at) VALUES (?1, ?2)",
            params![session_id, started_at as i64],
        )?;
        Ok(())
    }

    fn record_violation(&mut self, record: &ViolationRecord) -> Result<i64> {
        crate::validate_session_id(&record.session_id)?;
        self.conn.execute(
            r#"
            INSERT INTO violations (
                session_id,
                violation_type,
                description,
                screenshot_path,
                screenshot_sha256,
                detected_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.session_id,
                record.kind.as_str(),
                record.description,
                record.screenshot_path,
                record.screenshot_sha256.map(|h| h.to_vec()),
                record.detected_at as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn violations_for_session(&self, session_id: &str) -> Result<Vec<ViolationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, violation_type, description, screenshot_path,
                   screenshot_sha256, detected_at
            FROM violations WHERE session_id = ?1 ORDER BY id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![session_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get(1)?;
            let hash_bytes: Option<Vec<u8>> = row.get(4)?;
            let detected_at: i64 = row.get(5)?;
            records.push(ViolationRecord {
                session_id: row.get(0)?,
                kind: kind_text.parse()?,
                description: row.get(2)?,
                screenshot_path: row.get(3)?,
                screenshot_sha256: hash_bytes
                    .map(|bytes| blob32(bytes, "violations.screenshot_sha256"))
                    .transpose()?,
                detected_at: u64::try_from(detected_at)
                    .map_err(|_| anyhow!("corrupt violations.detected_at"))?,
            });
        }
        Ok(records)
    }

    fn count_by_kind(&self, session_id: &str, kind: ViolationKind) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM violations WHERE session_id = ?1 AND violation_type = ?2",
            params![session_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// In-memory store for tests and the disabled-persistence path.
#[derive(Default)]
pub struct InMemoryViolationStore {
    sessions: Vec<String>,
    records: Vec<ViolationRecord>,
}

impl InMemoryViolationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViolationStore for InMemoryViolationStore {
    fn start_session(&mut self, session_id: &str, _started_at: u64) -> Result<()> {
        crate::validate_session_id(session_id)?;
        if !self.sessions.iter().any(|s| s == session_id) {
            self.sessions.push(session_id.to_string());
        }
        Ok(())
    }

    fn record_violation(&mut self, record: &ViolationRecord) -> Result<i64> {
        crate::validate_session_id(&record.session_id)?;
        self.records.push(record.clone());
        Ok(self.records.len() as i64)
    }

    fn violations_for_session(&self, session_id: &str) -> Result<Vec<ViolationRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.session_id == session_id)
            .cloned()
            .collect())
    }

    fn count_by_kind(&self, session_id: &str, kind: ViolationKind) -> Result<u64> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.session_id == session_id && record.kind == kind)
            .count() as u64)
    }
}
