//! The assembled, null-filled record for one form.
//!
//! Every field is an `Option` that always serializes, so absent values render
//! as `null` and no key is ever missing from the JSON form.

use serde::{Deserialize, Serialize};

/// A ticked YES/NO box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Checkbox {
    Yes,
    No,
}

impl Checkbox {
    /// Exact, case-sensitive match against the allowed literals.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "YES" => Some(Self::Yes),
            "NO" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub patient_name: Option<String>,
    pub dob: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentDetails {
    pub date: Option<String>,
    pub injection: Option<Checkbox>,
    pub exercise_therapy: Option<Checkbox>,
}

/// Task difficulty, 0 (none) to 5 (unable).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRatings {
    pub bending_or_stooping: Option<i64>,
    pub putting_on_shoes: Option<i64>,
    pub sleeping: Option<i64>,
    pub standing_for_an_hour: Option<i64>,
    pub stairs: Option<i64>,
    pub walking_through_store: Option<i64>,
    pub driving: Option<i64>,
    pub preparing_meal: Option<i64>,
    pub yard_work: Option<i64>,
    pub picking_up_items: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientChanges {
    pub since_last_treatment: Option<String>,
    pub since_start_of_treatment: Option<String>,
    pub last_3_days: Option<String>,
}

/// Symptom intensity, 0 to 99.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainSymptoms {
    pub pain: Option<i64>,
    pub numbness: Option<i64>,
    pub tingling: Option<i64>,
    pub burning: Option<i64>,
    pub tightness: Option<i64>,
}

/// Vitals recorded by the medical assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalAssistantData {
    pub blood_pressure: Option<String>,
    pub hr: Option<i64>,
    pub weight: Option<i64>,
    pub height: Option<String>,
    pub spo2: Option<i64>,
    pub temperature: Option<String>,
    pub blood_glucose: Option<i64>,
    pub respirations: Option<i64>,
}

/// One parsed assessment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub patient_details: PatientDetails,
    pub treatment_details: TreatmentDetails,
    pub difficulty_ratings: DifficultyRatings,
    pub patient_changes: PatientChanges,
    pub pain_symptoms: PainSymptoms,
    pub medical_assistant_data: MedicalAssistantData,
}

impl StructuredRecord {
    /// Canonical pretty-printed JSON rendering.
    pub fn to_json_pretty(&self) -> formscan_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> formscan_core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
