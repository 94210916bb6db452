use std::cmp::Ordering;

use super::RagError;
use super::types::ScoredKey;
use crate::pipeline::storage::embedder::normalized;
use crate::pipeline::storage::types::{Chunk, EmbeddingModel, VectorRecord, VectorStore};
use crate::pipeline_config::RetrievalParams;

/// Cosine similarity; 0 for mismatched, empty or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// The `k` vectors most similar to `query`, best first. Equal scores keep
/// store order.
pub fn top_k(query: &[f32], vectors: &[VectorRecord], k: usize) -> Vec<ScoredKey> {
    let mut scored: Vec<ScoredKey> = vectors
        .iter()
        .map(|v| ScoredKey {
            key: v.key.clone(),
            score: cosine_similarity(query, &v.vector),
        })
        .collect();

    // stable: ties stay in insertion order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Maximal marginal relevance over `candidates`.
///
/// Each step picks the candidate maximizing
/// `lambda * relevance - (1 - lambda) * max_sim(selected)`; the first
/// candidate wins ties. Returns keys in selection order.
pub fn mmr(
    candidates: &[ScoredKey],
    vectors: &[VectorRecord],
    lambda: f32,
    final_n: usize,
) -> Vec<String> {
    let mut remaining: Vec<&ScoredKey> = candidates.iter().collect();
    let mut selected: Vec<&ScoredKey> = Vec::with_capacity(final_n);

    while selected.len() < final_n && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let candidate_vec = vector_of(vectors, &candidate.key);
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(candidate_vec, vector_of(vectors, &s.key)))
                .fold(None, |acc: Option<f32>, sim| Some(acc.map_or(sim, |a| a.max(sim))))
                .unwrap_or(0.0);
            let score = lambda * candidate.score - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected.into_iter().map(|s| s.key.clone()).collect()
}

fn vector_of<'a>(vectors: &'a [VectorRecord], key: &str) -> &'a [f32] {
    vectors
        .iter()
        .find(|v| v.key == key)
        .map(|v| v.vector.as_slice())
        .unwrap_or(&[])
}

/// Retrieve the `final_n` most relevant, mutually diverse chunks for `query`.
pub fn retrieve<E, V>(
    query: &str,
    embedder: &E,
    store: &V,
    params: &RetrievalParams,
) -> Result<Vec<Chunk>, RagError>
where
    E: EmbeddingModel + ?Sized,
    V: VectorStore + ?Sized,
{
    let vectors = store.all_vectors()?;
    if vectors.is_empty() {
        return Err(RagError::NotIndexed);
    }

    let query_vec = embedder
        .embed_query(query)
        .map(normalized)
        .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;

    let candidates = top_k(&query_vec, &vectors, params.top_k);
    let keys = mmr(&candidates, &vectors, params.lambda, params.final_n);

    tracing::debug!(
        stored = vectors.len(),
        candidates = candidates.len(),
        selected = keys.len(),
        "Retrieval complete"
    );

    Ok(store.chunks_by_keys(&keys)?)
}
