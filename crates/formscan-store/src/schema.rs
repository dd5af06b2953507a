//! Database schema SQL.

/// `patients` holds the identifying pair pulled from each form; `forms_data`
/// holds the full record JSON. One patient row is written per stored form.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    dob TEXT
);

CREATE TABLE IF NOT EXISTS forms_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    form_json TEXT NOT NULL,
    source_path TEXT,
    text_hash TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_forms_patient ON forms_data(patient_id);
CREATE INDEX IF NOT EXISTS idx_forms_text_hash ON forms_data(text_hash);
"#;
