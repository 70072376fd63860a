use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::error::ServiceResult;
use crate::models::{HiveRecord, HiveSectionRecord, RecordState, UserId};

/// SQLite store for hives and hive sections.
///
/// Each method is a single statement; the services re-read current state on
/// every operation and never hold rows across calls. The unique indexes on
/// `code` are the backstop for races between a service's pre-check and its
/// write.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database at the configured default path.
    pub fn open() -> anyhow::Result<Self> {
        AppConfig::ensure_dirs()?;
        let db_path = AppConfig::db_path()?;
        Self::open_at(db_path)
    }

    /// Opens (or creates) the database at the given path, creating parent
    /// directories as needed.
    pub fn open_at(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database dir: {}", parent.display()))?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self { conn };
        db.init_schema()?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Opens an in-memory database (for tests).
    pub fn open_in_memory() -> ServiceResult<Self> {
        let conn = Connection::open_in_memory()?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Creates tables and indices if they do not already exist.
    fn init_schema(&self) -> ServiceResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS hives (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                display_name TEXT NOT NULL,
                address TEXT NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_updated_by TEXT NOT NULL,
                last_updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS hive_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hive_id INTEGER NOT NULL REFERENCES hives(id),
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_updated_by TEXT NOT NULL,
                last_updated_at TEXT NOT NULL
            );

            -- Business-key uniqueness is whole-table for both entities.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_hives_code
                ON hives(code);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_hive_sections_code
                ON hive_sections(code);
            CREATE INDEX IF NOT EXISTS idx_hive_sections_hive
                ON hive_sections(hive_id);
            ",
        )?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // Hives
    // -----------------------------------------------------------------------

    /// Lists all hives ordered by id ascending, each with its section count.
    pub fn list_hives(&self) -> ServiceResult<Vec<(HiveRecord, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.id, h.code, h.name, h.display_name, h.address, h.is_deleted,
                    h.created_by, h.created_at, h.last_updated_by, h.last_updated_at,
                    (SELECT COUNT(*) FROM hive_sections s WHERE s.hive_id = h.id)
             FROM hives h
             ORDER BY h.id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let record = hive_from_row(row)?;
            let count: i64 = row.get(10)?;
            Ok((record, count as usize))
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Fetches a single hive by id, or `None` if it does not exist.
    pub fn get_hive(&self, id: i64) -> ServiceResult<Option<HiveRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, code, name, display_name, address, is_deleted,
                        created_by, created_at, last_updated_by, last_updated_at
                 FROM hives
                 WHERE id = ?1",
                params![id],
                hive_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Returns `true` if any hive other than `exclude` uses the given code.
    pub fn hive_code_in_use(&self, code: &str, exclude: Option<i64>) -> ServiceResult<bool> {
        let in_use: bool = self.conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM hives
                 WHERE code = ?1 AND (?2 IS NULL OR id <> ?2)
             )",
            params![code, exclude],
            |row| row.get(0),
        )?;
        Ok(in_use)
    }

    /// Inserts a hive and returns the assigned id. `record.id` is ignored.
    pub fn insert_hive(&self, record: &HiveRecord) -> ServiceResult<i64> {
        self.conn.execute(
            "INSERT INTO hives (code, name, display_name, address, is_deleted,
                                created_by, created_at, last_updated_by, last_updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.code,
                record.name,
                record.display_name,
                record.address,
                record.state.is_deleted(),
                record.created_by.as_str(),
                record.created_at,
                record.last_updated_by.as_str(),
                record.last_updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Writes the full row for an existing hive, keyed by `record.id`.
    pub fn update_hive(&self, record: &HiveRecord) -> ServiceResult<()> {
        self.conn.execute(
            "UPDATE hives
             SET code = ?2, name = ?3, display_name = ?4, address = ?5,
                 is_deleted = ?6, created_by = ?7, created_at = ?8,
                 last_updated_by = ?9, last_updated_at = ?10
             WHERE id = ?1",
            params![
                record.id,
                record.code,
                record.name,
                record.display_name,
                record.address,
                record.state.is_deleted(),
                record.created_by.as_str(),
                record.created_at,
                record.last_updated_by.as_str(),
                record.last_updated_at,
            ],
        )?;
        Ok(())
    }

    /// Permanently removes a hive row.
    pub fn delete_hive(&self, id: i64) -> ServiceResult<()> {
        self.conn
            .execute("DELETE FROM hives WHERE id = ?1", params![id])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Hive sections
    // -----------------------------------------------------------------------

    /// Lists all sections ordered by id ascending.
    pub fn list_sections(&self) -> ServiceResult<Vec<HiveSectionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, hive_id, code, name, is_deleted,
                    created_by, created_at, last_updated_by, last_updated_at
             FROM hive_sections
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], section_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Lists the sections of one hive ordered by id ascending.
    pub fn list_sections_of_hive(&self, hive_id: i64) -> ServiceResult<Vec<HiveSectionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, hive_id, code, name, is_deleted,
                    created_by, created_at, last_updated_by, last_updated_at
             FROM hive_sections
             WHERE hive_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![hive_id], section_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Fetches a single section by id, or `None` if it does not exist.
    pub fn get_section(&self, id: i64) -> ServiceResult<Option<HiveSectionRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, hive_id, code, name, is_deleted,
                        created_by, created_at, last_updated_by, last_updated_at
                 FROM hive_sections
                 WHERE id = ?1",
                params![id],
                section_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Returns `true` if any section other than `exclude` uses the given code.
    /// The probe is whole-table — section codes are not scoped to a parent.
    pub fn section_code_in_use(&self, code: &str, exclude: Option<i64>) -> ServiceResult<bool> {
        let in_use: bool = self.conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM hive_sections
                 WHERE code = ?1 AND (?2 IS NULL OR id <> ?2)
             )",
            params![code, exclude],
            |row| row.get(0),
        )?;
        Ok(in_use)
    }

    /// Inserts a section and returns the assigned id. `record.id` is ignored.
    pub fn insert_section(&self, record: &HiveSectionRecord) -> ServiceResult<i64> {
        self.conn.execute(
            "INSERT INTO hive_sections (hive_id, code, name, is_deleted,
                                        created_by, created_at, last_updated_by, last_updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.hive_id,
                record.code,
                record.name,
                record.state.is_deleted(),
                record.created_by.as_str(),
                record.created_at,
                record.last_updated_by.as_str(),
                record.last_updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Writes the full row for an existing section, keyed by `record.id`.
    pub fn update_section(&self, record: &HiveSectionRecord) -> ServiceResult<()> {
        self.conn.execute(
            "UPDATE hive_sections
             SET hive_id = ?2, code = ?3, name = ?4, is_deleted = ?5,
                 created_by = ?6, created_at = ?7,
                 last_updated_by = ?8, last_updated_at = ?9
             WHERE id = ?1",
            params![
                record.id,
                record.hive_id,
                record.code,
                record.name,
                record.state.is_deleted(),
                record.created_by.as_str(),
                record.created_at,
                record.last_updated_by.as_str(),
                record.last_updated_at,
            ],
        )?;
        Ok(())
    }

    /// Permanently removes a section row.
    pub fn delete_section(&self, id: i64) -> ServiceResult<()> {
        self.conn
            .execute("DELETE FROM hive_sections WHERE id = ?1", params![id])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn hive_from_row(row: &Row<'_>) -> rusqlite::Result<HiveRecord> {
    Ok(HiveRecord {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        display_name: row.get(3)?,
        address: row.get(4)?,
        state: RecordState::from_flag(row.get(5)?),
        created_by: UserId::new(row.get::<_, String>(6)?),
        created_at: row.get(7)?,
        last_updated_by: UserId::new(row.get::<_, String>(8)?),
        last_updated_at: row.get(9)?,
    })
}

fn section_from_row(row: &Row<'_>) -> rusqlite::Result<HiveSectionRecord> {
    Ok(HiveSectionRecord {
        id: row.get(0)?,
        hive_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        state: RecordState::from_flag(row.get(4)?),
        created_by: UserId::new(row.get::<_, String>(5)?),
        created_at: row.get(6)?,
        last_updated_by: UserId::new(row.get::<_, String>(7)?),
        last_updated_at: row.get(8)?,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
