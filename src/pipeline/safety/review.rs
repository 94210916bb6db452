//! Pre-generation review of a normalized record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::record::HospitalStay;
use crate::models::ClinicalRecord;

use super::types::Severity;

/// Record fields the narrative template depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    AdmissionReason,
    AdmissionDiagnoses,
    DischargeDiagnoses,
    Procedures,
    InpatientMedications,
    DischargeMedications,
    Controls,
    Recommendations,
    HospitalStay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIssue {
    pub field: RecordField,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputReview {
    /// Both diagnosis lists are present.
    pub is_valid: bool,
    pub missing_fields: Vec<RecordField>,
    pub issues: Vec<InputIssue>,
    pub duplicate_medications: Vec<String>,
    pub hospital_stay: Option<HospitalStay>,
}

impl InputReview {
    /// Issues at or above `min`, for surfacing next to a generated text.
    pub fn issues_at_least(&self, min: Severity) -> impl Iterator<Item = &InputIssue> {
        self.issues.iter().filter(move |i| i.severity >= min)
    }
}

/// Review a record before generation: missing sections, duplicated
/// discharge prescriptions and whether the stay length can be derived.
pub fn review_record(record: &ClinicalRecord) -> InputReview {
    let mut missing = Vec::new();
    let mut issues = Vec::new();
    let mut flag = |field: RecordField, missing_field: bool, severity: Severity, message: &str| {
        if missing_field {
            missing.push(field);
        }
        issues.push(InputIssue {
            field,
            message: message.to_string(),
            severity,
        });
    };

    if record.admission_reason.is_empty() {
        flag(RecordField::AdmissionReason, true, Severity::Medium, "Admission reason not recorded");
    }
    if record.admission_diagnoses.is_empty() {
        flag(RecordField::AdmissionDiagnoses, true, Severity::Medium, "Admission diagnosis not recorded");
    }
    if record.discharge_diagnoses.is_empty() {
        flag(RecordField::DischargeDiagnoses, true, Severity::Medium, "Discharge diagnosis not recorded");
    }
    if record.procedures.is_empty() {
        flag(RecordField::Procedures, false, Severity::Low, "No procedures recorded; the standard phrase will be used");
    }
    if record.inpatient_medications.is_empty() {
        flag(
            RecordField::InpatientMedications,
            false,
            Severity::Low,
            "No in-hospital treatments recorded; the standard phrase will be used",
        );
    }
    if record.discharge.medications.is_empty() {
        flag(RecordField::DischargeMedications, true, Severity::Medium, "No discharge medications");
    }
    if record.discharge.controls.is_empty() {
        flag(RecordField::Controls, true, Severity::Medium, "Follow-up controls not recorded");
    }
    if record.discharge.recommendations.is_empty() {
        flag(RecordField::Recommendations, true, Severity::Medium, "Discharge recommendations not recorded");
    }

    let hospital_stay = record.hospital_stay();
    if hospital_stay.is_none() {
        flag(RecordField::HospitalStay, false, Severity::Low, "Hospital stay length could not be computed");
    }

    let duplicate_medications = duplicate_medications(record);
    if !duplicate_medications.is_empty() {
        let message = format!(
            "Duplicated discharge medications: {}",
            duplicate_medications.join(", ")
        );
        flag(RecordField::DischargeMedications, false, Severity::Low, &message);
    }

    let is_valid = !missing.contains(&RecordField::AdmissionDiagnoses)
        && !missing.contains(&RecordField::DischargeDiagnoses);

    InputReview {
        is_valid,
        missing_fields: missing,
        issues,
        duplicate_medications,
        hospital_stay,
    }
}

/// Discharge medications listed more than once, keyed by ATC code or, when
/// uncoded, by lowercase name.
fn duplicate_medications(record: &ClinicalRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for med in &record.discharge.medications {
        if !seen.insert(med.dedup_key()) && !duplicates.contains(&med.name) {
            duplicates.push(med.name.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, DischargeInstructions, EvolutionNote, Medication};
    use chrono::NaiveDate;

    fn med(code: &str, name: &str) -> Medication {
        Medication {
            code: code.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_record_is_invalid_with_all_sections_missing() {
        let review = review_record(&ClinicalRecord::default());
        assert!(!review.is_valid);
        assert_eq!(review.missing_fields.len(), 6);
        assert!(review.missing_fields.contains(&RecordField::DischargeDiagnoses));
        assert_eq!(review.issues.len(), 9);
        assert!(review.hospital_stay.is_none());
    }

    #[test]
    fn complete_record_is_valid() {
        let dx = Diagnosis {
            code: "J18.9".into(),
            name: "Neumonia".into(),
        };
        let record = ClinicalRecord {
            admission_reason: "Fiebre".into(),
            admission_diagnoses: vec![dx.clone()],
            discharge_diagnoses: vec![dx],
            evolution: vec![
                EvolutionNote {
                    date: NaiveDate::from_ymd_opt(2024, 3, 1),
                    note: "Ingreso".into(),
                    author: None,
                },
                EvolutionNote {
                    date: NaiveDate::from_ymd_opt(2024, 3, 4),
                    note: "Alta".into(),
                    author: None,
                },
            ],
            discharge: DischargeInstructions {
                medications: vec![med("N02BE01", "Paracetamol")],
                controls: vec!["Control en 7 dias".into()],
                recommendations: vec!["Reposo".into()],
            },
            ..Default::default()
        };
        let review = review_record(&record);
        assert!(review.is_valid);
        assert!(review.missing_fields.is_empty());
        assert_eq!(review.hospital_stay.map(|s| s.days), Some(3));
        assert_eq!(review.issues_at_least(Severity::Medium).count(), 0);
    }

    #[test]
    fn detects_duplicate_discharge_medications() {
        let record = ClinicalRecord {
            discharge: DischargeInstructions {
                medications: vec![
                    med("N02BE01", "Paracetamol"),
                    med("N02BE01", "Paracetamol 1 g"),
                    med("", "Omeprazol"),
                    med("", "omeprazol"),
                    med("J01CA04", "Amoxicilina"),
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        let review = review_record(&record);
        assert_eq!(review.duplicate_medications, vec!["Paracetamol 1 g", "omeprazol"]);
    }
}
