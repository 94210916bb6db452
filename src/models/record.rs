use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Diagnosis, EvolutionNote, LabResult, Medication, Procedure};

/// Discharge instructions: prescriptions plus follow-up controls and
/// recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeInstructions {
    pub medications: Vec<Medication>,
    pub controls: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DischargeInstructions {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty() && self.controls.is_empty() && self.recommendations.is_empty()
    }
}

/// Canonical shape of one hospitalization episode.
///
/// Only produced by [`crate::pipeline::normalize::normalize`]; every
/// collection is already cleaned, codes are uppercase and procedures and
/// evolution notes are sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub admission_reason: String,
    pub admission_diagnoses: Vec<Diagnosis>,
    pub procedures: Vec<Procedure>,
    pub inpatient_medications: Vec<Medication>,
    pub evolution: Vec<EvolutionNote>,
    pub labs: Vec<LabResult>,
    pub discharge_diagnoses: Vec<Diagnosis>,
    pub discharge: DischargeInstructions,
}

/// Span between the first and last dated evolution note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalStay {
    pub admitted: NaiveDate,
    pub discharged: NaiveDate,
    pub days: i64,
}

impl ClinicalRecord {
    pub fn discharge_medications(&self) -> &[Medication] {
        &self.discharge.medications
    }

    /// Needs at least two dated evolution notes.
    pub fn hospital_stay(&self) -> Option<HospitalStay> {
        let mut dates = self.evolution.iter().filter_map(|e| e.date);
        let first = dates.next()?;
        let (min, max, count) = dates.fold((first, first, 1usize), |(lo, hi, n), d| {
            (lo.min(d), hi.max(d), n + 1)
        });
        if count < 2 {
            return None;
        }
        Some(HospitalStay {
            admitted: min,
            discharged: max,
            days: (max - min).num_days(),
        })
    }
}
