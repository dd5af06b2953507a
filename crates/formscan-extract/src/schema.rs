//! Output schema: the six groups of the assessment form and their fields.
//!
//! Group membership and field types are fixed here. Rule catalogs are checked
//! against this table and the record structs in [`crate::record`] mirror it
//! field for field.

use serde::{Deserialize, Serialize};

/// Value type a schema field holds once assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Checkbox,
}

/// Top-level section of the structured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    PatientDetails,
    TreatmentDetails,
    DifficultyRatings,
    PatientChanges,
    PainSymptoms,
    MedicalAssistantData,
}

/// Tasks rated 0-5 in the difficulty section, in form order.
pub const DIFFICULTY_TASKS: &[&str] = &[
    "bending_or_stooping",
    "putting_on_shoes",
    "sleeping",
    "standing_for_an_hour",
    "stairs",
    "walking_through_store",
    "driving",
    "preparing_meal",
    "yard_work",
    "picking_up_items",
];

/// Symptoms rated 0-99 in the pain section, in form order.
pub const PAIN_SYMPTOMS: &[&str] = &["pain", "numbness", "tingling", "burning", "tightness"];

const PATIENT_DETAILS: &[(&str, FieldType)] = &[
    ("patient_name", FieldType::Text),
    ("dob", FieldType::Text),
];

const TREATMENT_DETAILS: &[(&str, FieldType)] = &[
    ("date", FieldType::Text),
    ("injection", FieldType::Checkbox),
    ("exercise_therapy", FieldType::Checkbox),
];

const PATIENT_CHANGES: &[(&str, FieldType)] = &[
    ("since_last_treatment", FieldType::Text),
    ("since_start_of_treatment", FieldType::Text),
    ("last_3_days", FieldType::Text),
];

const MEDICAL_ASSISTANT_DATA: &[(&str, FieldType)] = &[
    ("blood_pressure", FieldType::Text),
    ("hr", FieldType::Integer),
    ("weight", FieldType::Integer),
    ("height", FieldType::Text),
    ("spo2", FieldType::Integer),
    ("temperature", FieldType::Text),
    ("blood_glucose", FieldType::Integer),
    ("respirations", FieldType::Integer),
];

impl Group {
    /// All groups in serialization order.
    pub const ALL: [Group; 6] = [
        Group::PatientDetails,
        Group::TreatmentDetails,
        Group::DifficultyRatings,
        Group::PatientChanges,
        Group::PainSymptoms,
        Group::MedicalAssistantData,
    ];

    /// JSON key of the group.
    pub fn key(self) -> &'static str {
        match self {
            Self::PatientDetails => "patient_details",
            Self::TreatmentDetails => "treatment_details",
            Self::DifficultyRatings => "difficulty_ratings",
            Self::PatientChanges => "patient_changes",
            Self::PainSymptoms => "pain_symptoms",
            Self::MedicalAssistantData => "medical_assistant_data",
        }
    }

    /// Declared fields of the group, in order.
    pub fn fields(self) -> Vec<(&'static str, FieldType)> {
        match self {
            Self::PatientDetails => PATIENT_DETAILS.to_vec(),
            Self::TreatmentDetails => TREATMENT_DETAILS.to_vec(),
            Self::DifficultyRatings => DIFFICULTY_TASKS
                .iter()
                .map(|name| (*name, FieldType::Integer))
                .collect(),
            Self::PatientChanges => PATIENT_CHANGES.to_vec(),
            Self::PainSymptoms => PAIN_SYMPTOMS
                .iter()
                .map(|name| (*name, FieldType::Integer))
                .collect(),
            Self::MedicalAssistantData => MEDICAL_ASSISTANT_DATA.to_vec(),
        }
    }

    /// Type of a declared field, or `None` if the group has no such field.
    pub fn field_type(self, field: &str) -> Option<FieldType> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, ty)| ty)
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique_within_group() {
        for group in Group::ALL {
            let fields = group.fields();
            let names: HashSet<_> = fields.iter().map(|(n, _)| *n).collect();
            assert_eq!(names.len(), fields.len(), "duplicate field in {}", group);
        }
    }

    #[test]
    fn test_field_type_lookup() {
        assert_eq!(Group::DifficultyRatings.field_type("stairs"), Some(FieldType::Integer));
        assert_eq!(Group::TreatmentDetails.field_type("injection"), Some(FieldType::Checkbox));
        assert_eq!(Group::MedicalAssistantData.field_type("height"), Some(FieldType::Text));
        assert_eq!(Group::PatientDetails.field_type("stairs"), None);
    }

    #[test]
    fn test_group_keys_match_serde() {
        for group in Group::ALL {
            let json = serde_json::to_value(group).unwrap();
            assert_eq!(json, serde_json::Value::String(group.key().to_string()));
        }
    }
}
