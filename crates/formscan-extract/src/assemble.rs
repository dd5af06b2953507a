//! Folds flat extraction results into the nested [`StructuredRecord`].

use crate::extractor::{FieldExtractor, FlatFields};
use crate::record::*;
use crate::registry::PatternRegistry;
use crate::schema::Group;

/// Builds records from flat results. Total: every schema field is filled,
/// with `None` for anything absent, missing, or of the wrong type.
pub struct FormAssembler;

impl FormAssembler {
    pub fn assemble(flat: &FlatFields) -> StructuredRecord {
        let text = |group: Group, name: &str| flat.get(group, name).as_text().map(str::to_string);
        let int = |group: Group, name: &str| flat.get(group, name).as_integer();
        let choice = |group: Group, name: &str| flat.get(group, name).as_choice();

        let pd = Group::PatientDetails;
        let td = Group::TreatmentDetails;
        let dr = Group::DifficultyRatings;
        let pc = Group::PatientChanges;
        let ps = Group::PainSymptoms;
        let ma = Group::MedicalAssistantData;

        StructuredRecord {
            patient_details: PatientDetails {
                patient_name: text(pd, "patient_name"),
                dob: text(pd, "dob"),
            },
            treatment_details: TreatmentDetails {
                date: text(td, "date"),
                injection: choice(td, "injection"),
                exercise_therapy: choice(td, "exercise_therapy"),
            },
            difficulty_ratings: DifficultyRatings {
                bending_or_stooping: int(dr, "bending_or_stooping"),
                putting_on_shoes: int(dr, "putting_on_shoes"),
                sleeping: int(dr, "sleeping"),
                standing_for_an_hour: int(dr, "standing_for_an_hour"),
                stairs: int(dr, "stairs"),
                walking_through_store: int(dr, "walking_through_store"),
                driving: int(dr, "driving"),
                preparing_meal: int(dr, "preparing_meal"),
                yard_work: int(dr, "yard_work"),
                picking_up_items: int(dr, "picking_up_items"),
            },
            patient_changes: PatientChanges {
                since_last_treatment: text(pc, "since_last_treatment"),
                since_start_of_treatment: text(pc, "since_start_of_treatment"),
                last_3_days: text(pc, "last_3_days"),
            },
            pain_symptoms: PainSymptoms {
                pain: int(ps, "pain"),
                numbness: int(ps, "numbness"),
                tingling: int(ps, "tingling"),
                burning: int(ps, "burning"),
                tightness: int(ps, "tightness"),
            },
            medical_assistant_data: MedicalAssistantData {
                blood_pressure: text(ma, "blood_pressure"),
                hr: int(ma, "hr"),
                weight: int(ma, "weight"),
                height: text(ma, "height"),
                spo2: int(ma, "spo2"),
                temperature: text(ma, "temperature"),
                blood_glucose: int(ma, "blood_glucose"),
                respirations: int(ma, "respirations"),
            },
        }
    }

    /// Extract with `registry` and assemble in one step.
    pub fn parse(registry: &PatternRegistry, text: &str) -> StructuredRecord {
        Self::assemble(&FieldExtractor::new(registry).extract_all(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{FieldValue, FlatFieldValue};

    #[test]
    fn test_empty_flat_yields_all_null() {
        let record = FormAssembler::assemble(&FlatFields::new());
        assert_eq!(record, StructuredRecord::default());

        let json = serde_json::to_value(&record).unwrap();
        for group in Group::ALL {
            for (name, _) in group.fields() {
                let value = json[group.key()]
                    .get(name)
                    .unwrap_or_else(|| panic!("missing key {}.{}", group, name));
                assert!(value.is_null());
            }
        }
    }

    #[test]
    fn test_present_values_unwrapped() {
        let mut flat = FlatFields::new();
        flat.insert(
            Group::PatientDetails,
            "patient_name",
            FlatFieldValue::Present(FieldValue::Text("Jane Doe".into())),
        );
        flat.insert(
            Group::PainSymptoms,
            "numbness",
            FlatFieldValue::Present(FieldValue::Integer(12)),
        );
        flat.insert(
            Group::TreatmentDetails,
            "injection",
            FlatFieldValue::Present(FieldValue::Choice(Checkbox::No)),
        );
        flat.insert(Group::DifficultyRatings, "stairs", FlatFieldValue::Absent);

        let record = FormAssembler::assemble(&flat);
        assert_eq!(record.patient_details.patient_name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.pain_symptoms.numbness, Some(12));
        assert_eq!(record.treatment_details.injection, Some(Checkbox::No));
        assert_eq!(record.difficulty_ratings.stairs, None);
        assert_eq!(record.patient_details.dob, None);
    }

    #[test]
    fn test_type_mismatch_reads_null() {
        let mut flat = FlatFields::new();
        flat.insert(
            Group::MedicalAssistantData,
            "hr",
            FlatFieldValue::Present(FieldValue::Text("seventy".into())),
        );
        let record = FormAssembler::assemble(&flat);
        assert_eq!(record.medical_assistant_data.hr, None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Patient Name : John Roe\nStairs: 2\nPain: 15\nINJECTION : YES\n";
        let registry = PatternRegistry::standard();
        let first = FormAssembler::parse(registry, text);
        let second = FormAssembler::parse(registry, text);
        assert_eq!(first, second);
        assert_eq!(first.difficulty_ratings.stairs, Some(2));
    }
}
