//! Applies compiled rules to raw OCR text.
//!
//! Each rule is evaluated on its own against the whole text. A label that is
//! missing, a number wider than its bound, or a checkbox token outside
//! `YES`/`NO` all produce [`FlatFieldValue::Absent`]. None of these are
//! errors and none are logged individually.
//!
//! Text values end at the next field label on the same line, or for multiline
//! rules at the next label-like line. A repeated label whose first value does
//! not fit the rule falls through to its next occurrence.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::record::Checkbox;
use crate::registry::{ExtractionRule, PatternRegistry, ValueKind};
use crate::schema::Group;
use formscan_core::{Error, Result};

/// A line that starts with a non-blank character and carries a colon, i.e.
/// the next label. Ends a multiline capture.
static PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\S[^\n]*:").unwrap());

/// A typed value recovered from the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Choice(Checkbox),
}

/// Outcome of one rule against one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatFieldValue {
    Present(FieldValue),
    Absent,
}

static ABSENT: FlatFieldValue = FlatFieldValue::Absent;

impl FlatFieldValue {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Present(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Present(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<Checkbox> {
        match self {
            Self::Present(FieldValue::Choice(c)) => Some(*c),
            _ => None,
        }
    }
}

/// Flat `(group, field) → value` results for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFields {
    values: HashMap<Group, HashMap<String, FlatFieldValue>>,
}

impl FlatFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: Group, field: impl Into<String>, value: FlatFieldValue) {
        self.values
            .entry(group)
            .or_default()
            .insert(field.into(), value);
    }

    /// Value for a field; fields that were never extracted read as `Absent`.
    pub fn get(&self, group: Group, field: &str) -> &FlatFieldValue {
        self.values
            .get(&group)
            .and_then(|fields| fields.get(field))
            .unwrap_or(&ABSENT)
    }

    /// Number of entries, present or absent.
    pub fn len(&self) -> usize {
        self.values.values().map(|fields| fields.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn present_count(&self) -> usize {
        self.values
            .values()
            .flat_map(|fields| fields.values())
            .filter(|v| v.is_present())
            .count()
    }
}

/// Runs every rule of a registry over a text.
pub struct FieldExtractor<'a> {
    registry: &'a PatternRegistry,
}

impl FieldExtractor<'static> {
    /// Extractor over the built-in registry.
    pub fn standard() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl<'a> FieldExtractor<'a> {
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self { registry }
    }

    /// Apply a single rule.
    pub fn extract(&self, rule: &ExtractionRule, text: &str) -> FlatFieldValue {
        let caps = match rule.pattern().captures(text) {
            Some(caps) => caps,
            None => return FlatFieldValue::Absent,
        };
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");

        let value = match rule.kind() {
            ValueKind::Text => {
                let region = if rule.multiline() { paragraph(raw) } else { raw };
                Some(FieldValue::Text(self.up_to_next_field(region).trim().to_string()))
            }
            ValueKind::Numeric { .. } => raw.parse::<i64>().ok().map(FieldValue::Integer),
            ValueKind::Checkbox => Checkbox::parse(raw).map(FieldValue::Choice),
        };

        match value {
            Some(v) => FlatFieldValue::Present(v),
            None => FlatFieldValue::Absent,
        }
    }

    /// Apply every rule. One field's absence never affects another.
    pub fn extract_all(&self, text: &str) -> FlatFields {
        let mut fields = FlatFields::new();
        for (group, rule) in self.registry.rules() {
            fields.insert(group, rule.field_name(), self.extract(rule, text));
        }

        debug!(
            "Extracted {}/{} fields from {} bytes of text",
            fields.present_count(),
            fields.len(),
            text.len()
        );
        fields
    }

    /// Like [`extract_all`](Self::extract_all) for raw bytes, which must be UTF-8.
    pub fn extract_utf8(&self, raw: &[u8]) -> Result<FlatFields> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::InvalidInput(format!("text is not valid UTF-8: {}", e)))?;
        Ok(self.extract_all(text))
    }

    fn up_to_next_field<'t>(&self, region: &'t str) -> &'t str {
        match self.registry.field_boundary().and_then(|re| re.find(region)) {
            Some(m) => &region[..m.start()],
            None => region,
        }
    }
}

/// Cut a multiline capture at the next label-like line.
fn paragraph(raw: &str) -> &str {
    match PARAGRAPH_END.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(text: &str, group: Group, name: &str) -> FlatFieldValue {
        FieldExtractor::standard()
            .extract_all(text)
            .get(group, name)
            .clone()
    }

    fn text(s: &str) -> FlatFieldValue {
        FlatFieldValue::Present(FieldValue::Text(s.to_string()))
    }

    fn int(n: i64) -> FlatFieldValue {
        FlatFieldValue::Present(FieldValue::Integer(n))
    }

    #[test]
    fn test_patient_details() {
        let t = "Patient Name : Jane Doe\nDOB : 1990-01-01\n";
        assert_eq!(field(t, Group::PatientDetails, "patient_name"), text("Jane Doe"));
        assert_eq!(field(t, Group::PatientDetails, "dob"), text("1990-01-01"));
    }

    #[test]
    fn test_colon_spacing_variants() {
        for t in ["DOB:1990-01-01", "DOB : 1990-01-01", "DOB\t:\t1990-01-01  "] {
            assert_eq!(field(t, Group::PatientDetails, "dob"), text("1990-01-01"), "{:?}", t);
        }
    }

    #[test]
    fn test_blank_value_is_present_empty() {
        let t = "Patient Name :   \nDOB : 1990-01-01";
        assert_eq!(field(t, Group::PatientDetails, "patient_name"), text(""));
    }

    #[test]
    fn test_label_is_case_sensitive() {
        let t = "patient name : Jane Doe\nPatient Nme : Jane Doe";
        assert_eq!(
            field(t, Group::PatientDetails, "patient_name"),
            FlatFieldValue::Absent
        );
    }

    #[test]
    fn test_label_needs_word_boundary() {
        let t = "THR : 80";
        assert_eq!(field(t, Group::MedicalAssistantData, "hr"), FlatFieldValue::Absent);
        assert_eq!(field("HR: 80", Group::MedicalAssistantData, "hr"), int(80));
    }

    #[test]
    fn test_difficulty_rating_width() {
        assert_eq!(field("Stairs: 3", Group::DifficultyRatings, "stairs"), int(3));
        assert_eq!(
            field("Stairs: 7", Group::DifficultyRatings, "stairs"),
            FlatFieldValue::Absent
        );
        assert_eq!(
            field("Stairs: 35", Group::DifficultyRatings, "stairs"),
            FlatFieldValue::Absent
        );
        assert_eq!(
            field("Putting On Shoes: 0", Group::DifficultyRatings, "putting_on_shoes"),
            int(0)
        );
    }

    #[test]
    fn test_pain_symptom_width() {
        assert_eq!(field("Pain: 7", Group::PainSymptoms, "pain"), int(7));
        assert_eq!(field("Tingling: 42", Group::PainSymptoms, "tingling"), int(42));
        assert_eq!(
            field("Burning: 100", Group::PainSymptoms, "burning"),
            FlatFieldValue::Absent
        );
    }

    #[test]
    fn test_checkbox() {
        let absent = field("INJECTION : MAYBE", Group::TreatmentDetails, "injection");
        assert_eq!(absent, FlatFieldValue::Absent);
        let yes = field("INJECTION : YES", Group::TreatmentDetails, "injection");
        assert_eq!(yes.as_choice(), Some(Checkbox::Yes));
        let no = field("Exercise Therapy: NO", Group::TreatmentDetails, "exercise_therapy");
        assert_eq!(no.as_choice(), Some(Checkbox::No));
        let partial = field("INJECTION : NOT SURE", Group::TreatmentDetails, "injection");
        assert_eq!(partial, FlatFieldValue::Absent);
    }

    #[test]
    fn test_multiline_stops_at_next_label() {
        let t = "Patient changes since last treatment: feeling better\nsleeping more\nDate : 2024-01-01";
        assert_eq!(
            field(t, Group::PatientChanges, "since_last_treatment"),
            text("feeling better\nsleeping more")
        );
        assert_eq!(field(t, Group::TreatmentDetails, "date"), text("2024-01-01"));
    }

    #[test]
    fn test_multiline_runs_to_end_of_text() {
        let t = "Patient changes since the start of treatment:\n  walks further\n  less stiffness\n";
        assert_eq!(
            field(t, Group::PatientChanges, "since_start_of_treatment"),
            text("walks further\n  less stiffness")
        );
    }

    #[test]
    fn test_single_line_text_stops_at_line_end() {
        let t = "Describe any functional changes within the last three days (good or bad): fewer falls\nHR: 72";
        assert_eq!(
            field(t, Group::PatientChanges, "last_3_days"),
            text("fewer falls")
        );
    }

    #[test]
    fn test_text_stops_at_next_label_on_line() {
        let t = "Patient Name : Jane Doe    DOB : 1990-01-01\nDate : 03/18/2024    INJECTION : YES";
        let flat = FieldExtractor::standard().extract_all(t);
        assert_eq!(flat.get(Group::PatientDetails, "patient_name"), &text("Jane Doe"));
        assert_eq!(flat.get(Group::PatientDetails, "dob"), &text("1990-01-01"));
        assert_eq!(flat.get(Group::TreatmentDetails, "date"), &text("03/18/2024"));
        assert_eq!(
            flat.get(Group::TreatmentDetails, "injection").as_choice(),
            Some(Checkbox::Yes)
        );
    }

    #[test]
    fn test_text_keeps_colons_that_are_not_labels() {
        let t = "Blood Pressure : 128/84 at 10:30    HR : 70";
        let flat = FieldExtractor::standard().extract_all(t);
        let g = Group::MedicalAssistantData;
        assert_eq!(flat.get(g, "blood_pressure").as_text(), Some("128/84 at 10:30"));
        assert_eq!(flat.get(g, "hr").as_integer(), Some(70));
    }

    #[test]
    fn test_multiline_stops_at_label_on_same_line() {
        let t = "Patient changes since last treatment: walking more    Pain: 3\nsleeping fine";
        assert_eq!(
            field(t, Group::PatientChanges, "since_last_treatment"),
            text("walking more")
        );
        assert_eq!(field(t, Group::PainSymptoms, "pain"), int(3));
    }

    #[test]
    fn test_repeated_label_takes_first_fitting_value() {
        let t = "HR : --\nHR : 72";
        assert_eq!(field(t, Group::MedicalAssistantData, "hr"), int(72));
        let t = "Stairs: 35\nStairs: 3";
        assert_eq!(field(t, Group::DifficultyRatings, "stairs"), int(3));
        let t = "DOB : 1990-01-01\nDOB : 1991-02-02";
        assert_eq!(field(t, Group::PatientDetails, "dob"), text("1990-01-01"));
    }

    #[test]
    fn test_vitals_with_units_attached() {
        let t = "HR : 76bpm\nWeight : 162lbs\nSpO2 : 97%\nBlood Glucose : 110mg/dL\nRespirations : 14/min";
        let flat = FieldExtractor::standard().extract_all(t);
        let g = Group::MedicalAssistantData;
        assert_eq!(flat.get(g, "hr").as_integer(), Some(76));
        assert_eq!(flat.get(g, "weight").as_integer(), Some(162));
        assert_eq!(flat.get(g, "spo2").as_integer(), Some(97));
        assert_eq!(flat.get(g, "blood_glucose").as_integer(), Some(110));
        assert_eq!(flat.get(g, "respirations").as_integer(), Some(14));
    }

    #[test]
    fn test_vitals() {
        let t = "Blood Pressure: 120/80\nHR: 72\nWeight: 180.5 lbs\nHeight: 5'10\"\nSpO2: 98\nTemperature: 98.6 F\nBlood Glucose: 105\nRespirations: 16";
        let flat = FieldExtractor::standard().extract_all(t);
        let g = Group::MedicalAssistantData;
        assert_eq!(flat.get(g, "blood_pressure").as_text(), Some("120/80"));
        assert_eq!(flat.get(g, "hr").as_integer(), Some(72));
        assert_eq!(flat.get(g, "weight").as_integer(), Some(180));
        assert_eq!(flat.get(g, "height").as_text(), Some("5'10\""));
        assert_eq!(flat.get(g, "spo2").as_integer(), Some(98));
        assert_eq!(flat.get(g, "temperature").as_text(), Some("98.6 F"));
        assert_eq!(flat.get(g, "blood_glucose").as_integer(), Some(105));
        assert_eq!(flat.get(g, "respirations").as_integer(), Some(16));
    }

    #[test]
    fn test_numeric_overflow_is_absent() {
        let t = "HR: 99999999999999999999999";
        assert_eq!(field(t, Group::MedicalAssistantData, "hr"), FlatFieldValue::Absent);
    }

    #[test]
    fn test_extract_all_covers_every_rule() {
        let flat = FieldExtractor::standard().extract_all("");
        assert_eq!(flat.len(), PatternRegistry::standard().len());
        assert_eq!(flat.present_count(), 0);
    }

    #[test]
    fn test_missing_entry_reads_absent() {
        let flat = FlatFields::new();
        assert_eq!(flat.get(Group::PainSymptoms, "pain"), &FlatFieldValue::Absent);
    }

    #[test]
    fn test_extract_utf8_rejects_invalid_bytes() {
        let extractor = FieldExtractor::standard();
        let err = extractor.extract_utf8(&[0x44, 0x4f, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let flat = extractor.extract_utf8(b"DOB : 2001-02-03").unwrap();
        assert_eq!(flat.get(Group::PatientDetails, "dob").as_text(), Some("2001-02-03"));
    }
}
