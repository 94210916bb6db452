use std::fmt;

use serde::{Deserialize, Serialize};

/// Whitelist category a mention is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionCategory {
    Dx,
    Proc,
    Med,
}

impl MentionCategory {
    pub const ALL: [MentionCategory; 3] = [Self::Dx, Self::Proc, Self::Med];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dx => "dx",
            Self::Proc => "proc",
            Self::Med => "med",
        }
    }

    /// Heading used when listing violations back to the generator.
    pub fn label_es(&self) -> &'static str {
        match self {
            Self::Dx => "Diagnóstico",
            Self::Proc => "Procedimiento",
            Self::Med => "Medicamento",
        }
    }
}

/// Why a mention was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Code-shaped token absent from every code whitelist.
    UnauthorizedCode,
    /// Long clinical-looking phrase with a disease/drug/procedure
    /// morphology and no whitelist support.
    UnlistedClinicalTerm,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnauthorizedCode => write!(f, "Medical code not present in the source record"),
            Self::UnlistedClinicalTerm => {
                write!(f, "Possible specific clinical term not present in the source record")
            }
        }
    }
}

/// A mention in generated text that cannot be traced to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub category: MentionCategory,
    pub mention: String,
    pub reason: ViolationReason,
}

/// Result of validating one narrative against its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }

    pub fn count(&self, category: MentionCategory) -> usize {
        self.violations.iter().filter(|v| v.category == category).count()
    }
}

/// Warning severity for input review and output checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}
