use serde::{Deserialize, Serialize};

/// ATC coded medication, used both for in-hospital treatments and discharge
/// prescriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub code: String,
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Medication {
    pub fn label(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.code)
        }
    }

    /// Identity used to spot repeated prescriptions: the ATC code, or the
    /// lowercase name when uncoded.
    pub fn dedup_key(&self) -> String {
        if self.code.is_empty() {
            self.name.to_lowercase()
        } else {
            self.code.clone()
        }
    }

    /// "name dose route frequency", skipping empty parts.
    pub fn posology(&self) -> String {
        [
            self.name.as_str(),
            self.dose.as_str(),
            self.route.as_str(),
            self.frequency.as_str(),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}
