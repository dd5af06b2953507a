//! Row types for stored forms.

use formscan_extract::StructuredRecord;
use serde::{Deserialize, Serialize};

/// A `forms_data` row with its record decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredForm {
    pub id: i64,
    pub patient_id: i64,
    pub record: StructuredRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// SHA-256 (hex) of the OCR text the record was parsed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_hash: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Options for storing a record.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub source_path: Option<String>,
    pub text_hash: Option<String>,
    pub created_at: Option<i64>,
}
