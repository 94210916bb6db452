use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::models::ClinicalRecord;

/// Section of the record a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Summary,
    DailyEvolution,
    Labs,
    Discharge,
}

impl ChunkType {
    /// Narrative order: summary, evolution, labs, discharge.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Summary => 0,
            Self::DailyEvolution => 1,
            Self::Labs => 2,
            Self::Discharge => 3,
        }
    }
}

/// An independently retrievable passage of one record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{record_id}::{section}[:{day}]`
    pub key: String,
    pub text: String,
    /// Citation label shown next to the passage in prompts.
    pub source_hint: String,
    pub chunk_type: ChunkType,
    /// 1-based evolution day, only for `DailyEvolution`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<usize>,
}

/// Embedding of one chunk, keyed like the chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub key: String,
    pub vector: Vec<f32>,
}

/// Chunking strategy trait
pub trait Chunker {
    fn chunk(&self, record: &ClinicalRecord, record_id: &str) -> Vec<Chunk>;
}

/// Embedding model abstraction.
///
/// Asymmetric retrieval models embed queries and passages differently;
/// the defaults treat both sides alike.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError>;
    fn dimension(&self) -> usize;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.embed(text)
    }

    fn embed_passage(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        texts.iter().map(|t| self.embed_passage(t)).collect()
    }
}

/// Allow `Box<dyn EmbeddingModel>` to be used as `&impl EmbeddingModel`.
impl EmbeddingModel for Box<dyn EmbeddingModel> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        (**self).embed(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        (**self).embed_query(text)
    }

    fn embed_passage(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        (**self).embed_passage(text)
    }
}

/// Key-value store for the chunks and vectors of the active record.
///
/// Single-tenant: `clear` drops everything before a new record is indexed.
/// Iteration order is insertion order.
pub trait VectorStore {
    fn clear(&self) -> Result<(), StorageError>;
    fn put_chunk(&self, chunk: &Chunk) -> Result<(), StorageError>;
    fn put_vector(&self, record: &VectorRecord) -> Result<(), StorageError>;
    fn all_vectors(&self) -> Result<Vec<VectorRecord>, StorageError>;
    fn all_chunks(&self) -> Result<Vec<Chunk>, StorageError>;
    /// Chunks in the order of `keys`; unknown keys are skipped.
    fn chunks_by_keys(&self, keys: &[String]) -> Result<Vec<Chunk>, StorageError>;
    fn chunk_count(&self) -> Result<usize, StorageError>;
}
