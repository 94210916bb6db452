//! Safety core for generated hospital discharge summaries (epicrisis).
//!
//! Raw clinical JSON is normalized into a [`models::ClinicalRecord`], cut
//! into retrievable passages, and every generated narrative is checked
//! against the record before it is shown.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod pipeline_config;

pub use models::ClinicalRecord;
pub use pipeline::normalize::normalize;
pub use pipeline::rag::local::LocalRag;
pub use pipeline::rag::orchestrator::{DischargeSummaryPipeline, Narrator};
pub use pipeline::rag::RagError;
pub use pipeline::safety::{check_completeness, validate, ValidationResult};
pub use pipeline::storage::StorageError;
