use std::time::Instant;

use super::StorageError;
use super::embedder::normalized;
use super::types::{Chunk, EmbeddingModel, VectorRecord, VectorStore};

/// Replace the store contents with `chunks` and their passage embeddings.
///
/// One sequential pass: clear, then embed and put each chunk. Any failure
/// clears the store again before the error is returned, so a half-built
/// index is never retrievable.
pub fn index_chunks<E, V>(chunks: &[Chunk], embedder: &E, store: &V) -> Result<usize, StorageError>
where
    E: EmbeddingModel + ?Sized,
    V: VectorStore + ?Sized,
{
    let start = Instant::now();
    store.clear()?;

    if let Err(e) = embed_and_store(chunks, embedder, store) {
        tracing::warn!(error = %e, "Indexing aborted, store cleared");
        store.clear()?;
        return Err(e);
    }

    tracing::info!(
        chunks = chunks.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Record indexed"
    );
    Ok(chunks.len())
}

fn embed_and_store<E, V>(chunks: &[Chunk], embedder: &E, store: &V) -> Result<(), StorageError>
where
    E: EmbeddingModel + ?Sized,
    V: VectorStore + ?Sized,
{
    let expected = embedder.dimension();
    for chunk in chunks {
        let vector = embedder.embed_passage(&chunk.text)?;
        if vector.len() != expected {
            return Err(StorageError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        store.put_chunk(chunk)?;
        store.put_vector(&VectorRecord {
            key: chunk.key.clone(),
            vector: normalized(vector),
        })?;
    }
    Ok(())
}
