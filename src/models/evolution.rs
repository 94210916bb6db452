use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily progress note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNote {
    pub date: Option<NaiveDate>,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}
