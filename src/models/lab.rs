use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabResult {
    pub parameter: String,
    pub value: String,
    pub date: Option<NaiveDate>,
}
