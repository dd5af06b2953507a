//! Form intake pipeline: document → text → record → store.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::ocr::TextSource;
use formscan_core::Result;
use formscan_extract::{FieldExtractor, FormAssembler, PatternRegistry, StructuredRecord};
use formscan_store::{FormStore, StoreOptions};

/// Result of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub record: StructuredRecord,
    /// `forms_data` id when a store was attached.
    pub record_id: Option<i64>,
    pub text_hash: String,
    pub fields_present: usize,
    pub fields_total: usize,
}

/// Runs text production, extraction and persistence for single documents.
pub struct FormIngester<'a> {
    source: &'a dyn TextSource,
    registry: &'a PatternRegistry,
    store: Option<&'a FormStore>,
}

impl<'a> FormIngester<'a> {
    pub fn new(source: &'a dyn TextSource, registry: &'a PatternRegistry) -> Self {
        Self {
            source,
            registry,
            store: None,
        }
    }

    /// Persist every processed record into `store`.
    pub fn with_store(mut self, store: &'a FormStore) -> Self {
        self.store = Some(store);
        self
    }

    /// OCR `path` and turn the text into a record.
    pub fn process_file(&self, path: &Path) -> Result<IngestOutcome> {
        let text = self.source.produce_text(path)?;
        if text.is_empty() {
            warn!("No text recognised in {}", path.display());
        }
        self.process_text(&text, Some(&path.display().to_string()))
    }

    /// Parse already-recognised text. `source_path` is recorded with the row.
    pub fn process_text(&self, text: &str, source_path: Option<&str>) -> Result<IngestOutcome> {
        let flat = FieldExtractor::new(self.registry).extract_all(text);
        let record = FormAssembler::assemble(&flat);
        let text_hash = text_hash(text);
        let fields_present = flat.present_count();
        let fields_total = flat.len();
        let label = source_path.unwrap_or("<text>");

        if fields_present == 0 {
            warn!("No fields recognised in {}", label);
        }

        let record_id = match self.store {
            Some(store) => Some(store.store(
                &record,
                StoreOptions {
                    source_path: source_path.map(str::to_string),
                    text_hash: Some(text_hash.clone()),
                    ..Default::default()
                },
            )?),
            None => None,
        };

        info!(
            "Processed {}: {}/{} fields recognised{}",
            label,
            fields_present,
            fields_total,
            record_id
                .map(|id| format!(", stored as form {}", id))
                .unwrap_or_default()
        );

        Ok(IngestOutcome {
            record,
            record_id,
            text_hash,
            fields_present,
            fields_total,
        })
    }
}

/// Compute SHA-256 hash of OCR text.
pub fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
