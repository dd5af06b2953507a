//! SQLite-backed store for structured records.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use formscan_core::{Error, Result};
use formscan_extract::StructuredRecord;

/// SQLite store for parsed forms.
pub struct FormStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

/// Columns of a `forms_data` row before the JSON is decoded.
struct FormRow {
    id: i64,
    patient_id: i64,
    form_json: String,
    source_path: Option<String>,
    text_hash: Option<String>,
    created_at: i64,
}

impl FormStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/formscan.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("formscan.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self::with_connection(conn, db_path)?;
        info!(
            "FormStore initialized: {} forms, path={}",
            store.count_forms()?,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Transient store, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::with_connection(conn, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Persist a record. Writes the patient row and the form row in one
    /// transaction and returns the form id.
    pub fn store(&self, record: &StructuredRecord, opts: StoreOptions) -> Result<i64> {
        let form_json = serde_json::to_string(record)?;
        let now = opts
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let details = &record.patient_details;

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO patients (name, dob) VALUES (?1, ?2)",
            params![details.patient_name, details.dob],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        let patient_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO forms_data (patient_id, form_json, source_path, text_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![patient_id, form_json, opts.source_path, opts.text_hash, now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        let form_id = tx.last_insert_rowid();

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Stored form {} for patient row {}", form_id, patient_id);
        Ok(form_id)
    }

    /// Get a stored form by id.
    pub fn get_form(&self, form_id: i64) -> Result<Option<StoredForm>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM forms_data WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![form_id], Self::read_row)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);
        row.map(Self::decode).transpose()
    }

    /// Forms parsed from byte-identical OCR text, oldest first.
    pub fn find_forms_by_text_hash(&self, text_hash: &str) -> Result<Vec<StoredForm>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM forms_data WHERE text_hash = ?1 ORDER BY id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![text_hash], Self::read_row)
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<rusqlite::Result<Vec<FormRow>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(stmt);
        drop(conn);
        rows.into_iter().map(Self::decode).collect()
    }

    /// Count stored forms.
    pub fn count_forms(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM forms_data", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count patient rows.
    pub fn count_patients(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FormRow> {
        Ok(FormRow {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            form_json: row.get("form_json")?,
            source_path: row.get("source_path")?,
            text_hash: row.get("text_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    fn decode(row: FormRow) -> Result<StoredForm> {
        let record = serde_json::from_str(&row.form_json).map_err(|e| {
            Error::Storage(format!("form {} has unreadable JSON: {}", row.id, e))
        })?;
        Ok(StoredForm {
            id: row.id,
            patient_id: row.patient_id,
            record,
            source_path: row.source_path,
            text_hash: row.text_hash,
            created_at: row.created_at,
        })
    }
}
