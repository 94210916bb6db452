use super::prompt::{build_discharge_prompt, build_question_prompt};
use super::retrieval::retrieve;
use super::types::{LlmGenerate, LocalSummary, RagAnswer};
use super::RagError;
use crate::models::ClinicalRecord;
use crate::pipeline::safety::{check_output, review_record, Severity};
use crate::pipeline::storage::chunker::RecordChunker;
use crate::pipeline::storage::orchestrator::index_chunks;
use crate::pipeline::storage::types::{Chunk, Chunker, EmbeddingModel, VectorStore};
use crate::pipeline_config::{GenerationConfig, RetrievalParams};

pub const NO_CONTEXT_ANSWER: &str = "No se encontro informacion relevante.";

/// Retrieval-augmented access to one indexed record.
///
/// Owns the embedder and the store; indexing a new record replaces the
/// previous one.
pub struct LocalRag<E: EmbeddingModel, V: VectorStore> {
    embedder: E,
    store: V,
    chunker: RecordChunker,
    params: RetrievalParams,
}

impl<E: EmbeddingModel, V: VectorStore> LocalRag<E, V> {
    pub fn new(embedder: E, store: V) -> Self {
        Self::with_params(embedder, store, RetrievalParams::default())
    }

    pub fn with_params(embedder: E, store: V, params: RetrievalParams) -> Self {
        Self {
            embedder,
            store,
            chunker: RecordChunker::new(),
            params,
        }
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Chunk and embed `record`. Returns the number of chunks stored.
    pub fn index_record(&self, record: &ClinicalRecord, record_id: &str) -> Result<usize, RagError> {
        let chunks = self.chunker.chunk(record, record_id);
        Ok(index_chunks(&chunks, &self.embedder, &self.store)?)
    }

    pub fn retrieve(&self, query: &str) -> Result<Vec<Chunk>, RagError> {
        retrieve(query, &self.embedder, &self.store, &self.params)
    }

    /// Answer `question` from the retrieved passages. Without indexed
    /// passages the generator is not called.
    pub fn ask_question<G>(&self, question: &str, generator: &G) -> Result<RagAnswer, RagError>
    where
        G: LlmGenerate + ?Sized,
    {
        let chunks = match self.retrieve(question) {
            Ok(chunks) => chunks,
            Err(RagError::NotIndexed) => Vec::new(),
            Err(e) => return Err(e),
        };

        if chunks.is_empty() {
            return Ok(RagAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let prompt = build_question_prompt(question, &chunks);
        let answer = generator.generate(&prompt, &GenerationConfig::rag())?;
        Ok(RagAnswer {
            answer,
            sources: chunks,
        })
    }

    /// Discharge text for the indexed record, checked against every stored
    /// passage (summary, evolution, labs, discharge).
    pub fn generate_local_summary<G>(
        &self,
        record: &ClinicalRecord,
        generator: &G,
    ) -> Result<LocalSummary, RagError>
    where
        G: LlmGenerate + ?Sized,
    {
        let mut chunks = self.store.all_chunks()?;
        if chunks.is_empty() {
            return Err(RagError::NotIndexed);
        }
        chunks.sort_by_key(|c| c.chunk_type.rank());

        let input_review = review_record(record);
        for issue in input_review.issues_at_least(Severity::Medium) {
            tracing::debug!(field = ?issue.field, "Record review: {}", issue.message);
        }

        let prompt = build_discharge_prompt(record);
        let text = generator.generate(&prompt, &GenerationConfig::discharge_summary())?;

        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let output_check = check_output(&text, &context, record);

        tracing::info!(
            chunks = chunks.len(),
            warnings = output_check.warnings.len(),
            input_valid = input_review.is_valid,
            "Local summary generated"
        );

        Ok(LocalSummary {
            text,
            input_review,
            output_check,
        })
    }
}
