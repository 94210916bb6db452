pub mod types;
pub mod retrieval;
pub mod prompt;
pub mod generator;
pub mod ollama;
pub mod local;
pub mod orchestrator;

use thiserror::Error;

use crate::pipeline::storage::StorageError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Ollama connection failed: {0}")]
    OllamaConnection(String),

    #[error("Ollama returned HTTP {status}: {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Query embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("No record indexed")]
    NotIndexed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
