pub mod types;
pub mod chunker;
pub mod embedder;
pub mod vectordb;
pub mod orchestrator;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Vector DB error: {0}")]
    VectorDb(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding backend unreachable: {0}")]
    EmbeddingConnection(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
