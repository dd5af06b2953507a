//! FormScan Extract — turns OCR text from the clinical assessment form into a
//! structured record.
//!
//! The pipeline is `raw text → FieldExtractor::extract_all → FlatFields →
//! FormAssembler::assemble → StructuredRecord`. Rules are declared as data in a
//! [`Catalog`] and compiled once into a [`PatternRegistry`].

pub mod assemble;
pub mod extractor;
pub mod record;
pub mod registry;
pub mod schema;

pub use assemble::FormAssembler;
pub use extractor::{FieldExtractor, FieldValue, FlatFieldValue, FlatFields};
pub use record::{
    Checkbox, DifficultyRatings, MedicalAssistantData, PainSymptoms, PatientChanges,
    PatientDetails, StructuredRecord, TreatmentDetails,
};
pub use registry::{
    rule_for_name, title_label, Catalog, ExtractionRule, NumericBound, PatternRegistry, RuleSpec,
    ValueKind,
};
pub use schema::{FieldType, Group, DIFFICULTY_TASKS, PAIN_SYMPTOMS};
