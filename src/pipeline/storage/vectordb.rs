use std::sync::{Mutex, MutexGuard};

use super::StorageError;
use super::types::{Chunk, VectorRecord, VectorStore};

/// In-memory store for the chunks and vectors of the active record.
/// Writing an existing key replaces the entry in place.
pub struct InMemoryVectorStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    chunks: Vec<Chunk>,
    vectors: Vec<VectorRecord>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::VectorDb("Store lock poisoned".to_string()))
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for InMemoryVectorStore {
    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.chunks.clear();
        state.vectors.clear();
        Ok(())
    }

    fn put_chunk(&self, chunk: &Chunk) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        match state.chunks.iter().position(|c| c.key == chunk.key) {
            Some(idx) => state.chunks[idx] = chunk.clone(),
            None => state.chunks.push(chunk.clone()),
        }
        Ok(())
    }

    fn put_vector(&self, record: &VectorRecord) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        match state.vectors.iter().position(|v| v.key == record.key) {
            Some(idx) => state.vectors[idx] = record.clone(),
            None => state.vectors.push(record.clone()),
        }
        Ok(())
    }

    fn all_vectors(&self) -> Result<Vec<VectorRecord>, StorageError> {
        Ok(self.lock()?.vectors.clone())
    }

    fn all_chunks(&self) -> Result<Vec<Chunk>, StorageError> {
        Ok(self.lock()?.chunks.clone())
    }

    fn chunks_by_keys(&self, keys: &[String]) -> Result<Vec<Chunk>, StorageError> {
        let state = self.lock()?;
        Ok(keys
            .iter()
            .filter_map(|key| state.chunks.iter().find(|c| &c.key == key).cloned())
            .collect())
    }

    fn chunk_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.chunks.len())
    }
}
