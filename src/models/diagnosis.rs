use serde::{Deserialize, Serialize};

/// CIE-10 coded diagnosis. Either field may be empty, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub code: String,
    pub name: String,
}

impl Diagnosis {
    /// `name (code)` for prompts and correction lists.
    pub fn label(&self) -> String {
        match (self.name.is_empty(), self.code.is_empty()) {
            (false, false) => format!("{} ({})", self.name, self.code),
            (false, true) => self.name.clone(),
            _ => self.code.clone(),
        }
    }
}
