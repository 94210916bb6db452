use serde::{Deserialize, Serialize};

use super::RagError;
use crate::pipeline::safety::{
    CompletenessWarning, InputReview, OutputCheck, ValidationResult,
};
use crate::pipeline::storage::types::Chunk;
use crate::pipeline_config::GenerationConfig;

/// Text generation seam. Implementations must not retry on their own.
pub trait LlmGenerate {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, RagError>;
}

impl<G: LlmGenerate + ?Sized> LlmGenerate for Box<G> {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, RagError> {
        (**self).generate(prompt, config)
    }
}

/// A stored vector with its cosine score against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKey {
    pub key: String,
    pub score: f32,
}

/// Answer to a free-text question over the indexed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Chunk>,
}

/// Discharge text generated from the indexed passages, with the input
/// review and the output checks run around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSummary {
    pub text: String,
    pub input_review: InputReview,
    pub output_check: OutputCheck,
}

impl LocalSummary {
    /// Output passed and the record had both diagnosis lists.
    pub fn ok(&self) -> bool {
        self.output_check.ok && self.input_review.is_valid
    }
}

/// Result of the generate → validate → correct loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub text: String,
    pub validation: ValidationResult,
    pub warnings: Vec<CompletenessWarning>,
    /// A correction pass was needed.
    pub regenerated: bool,
}
