use serde::{Deserialize, Serialize};

use crate::models::ClinicalRecord;
use crate::pipeline_config::MIN_NARRATIVE_CHARS;

use super::text::folded_lower;

/// Non-blocking findings about what a narrative leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletenessWarning {
    MissingDischargeDiagnosis { diagnosis: String },
    MissingDischargeMedication { medication: String },
    NarrativeTooShort { chars: usize },
}

impl CompletenessWarning {
    pub fn message(&self) -> String {
        match self {
            Self::MissingDischargeDiagnosis { diagnosis } => {
                format!("Discharge diagnosis not mentioned: {diagnosis}")
            }
            Self::MissingDischargeMedication { medication } => {
                format!("Discharge medication not mentioned: {medication}")
            }
            Self::NarrativeTooShort { chars } => {
                format!("Narrative is too short for a discharge summary ({chars} characters)")
            }
        }
    }
}

fn mentions(text: &str, needle: &str) -> bool {
    let needle = folded_lower(needle.trim());
    !needle.is_empty() && text.contains(&needle)
}

/// Every discharge diagnosis (by name or code) and discharge medication
/// (by name or code) must appear in the narrative.
pub fn check_completeness(narrative: &str, record: &ClinicalRecord) -> Vec<CompletenessWarning> {
    let text = folded_lower(narrative);
    let mut warnings = Vec::new();

    for dx in &record.discharge_diagnoses {
        if !mentions(&text, &dx.name) && !mentions(&text, &dx.code) {
            warnings.push(CompletenessWarning::MissingDischargeDiagnosis {
                diagnosis: dx.label(),
            });
        }
    }

    for med in &record.discharge.medications {
        if !mentions(&text, &med.name) && !mentions(&text, &med.code) {
            warnings.push(CompletenessWarning::MissingDischargeMedication {
                medication: med.name.clone(),
            });
        }
    }

    let chars = narrative.trim().chars().count();
    if chars < MIN_NARRATIVE_CHARS && !record.discharge_diagnoses.is_empty() {
        warnings.push(CompletenessWarning::NarrativeTooShort { chars });
    }

    if !warnings.is_empty() {
        tracing::debug!(warnings = warnings.len(), "Narrative completeness gaps");
    }
    warnings
}
