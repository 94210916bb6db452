//! Tunable parameters for generation, retrieval and validation.
//!
//! Defaults reproduce the values the discharge workflow was calibrated
//! with. Every struct deserializes with `#[serde(default)]` so deployments
//! can override individual fields from a JSON or TOML document.

use serde::{Deserialize, Serialize};

use crate::pipeline::safety::vocabulary;

// ═══════════════════════════════════════════════════════════
// Generation
// ═══════════════════════════════════════════════════════════

/// Decoding parameters passed to the external generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub min_length: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    /// `false` requests greedy decoding.
    pub sample: bool,
}

impl GenerationConfig {
    /// Full discharge narrative.
    pub const fn discharge_summary() -> Self {
        Self {
            max_new_tokens: 600,
            min_length: 100,
            temperature: 0.1,
            top_p: 0.85,
            repetition_penalty: 1.2,
            sample: true,
        }
    }

    /// Question answering over retrieved passages.
    pub const fn rag() -> Self {
        Self {
            max_new_tokens: 512,
            min_length: 50,
            temperature: 0.2,
            top_p: 0.9,
            repetition_penalty: 1.1,
            sample: true,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::discharge_summary()
    }
}

// ═══════════════════════════════════════════════════════════
// Retrieval
// ═══════════════════════════════════════════════════════════

/// Candidate pool size, final passage count and MMR trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalParams {
    pub top_k: usize,
    pub final_n: usize,
    /// Weight of query relevance against redundancy, in `[0, 1]`.
    pub lambda: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 10,
            final_n: 3,
            lambda: 0.7,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════

/// Thresholds and vocabularies of the hallucination heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub min_ngram: usize,
    pub max_ngram: usize,
    /// Shorter phrases are treated as context and never flagged.
    pub min_heuristic_words: usize,
    /// A whitelisted name inside a phrase clears it only if at least this long.
    pub name_in_phrase_min_len: usize,
    /// A phrase inside a whitelisted name clears it only if at least this long.
    pub phrase_in_name_min_len: usize,
    pub triggers: Vec<String>,
    pub common_phrases: Vec<String>,
    pub common_terms: Vec<String>,
    pub diagnosis_suffixes: Vec<String>,
    pub medication_suffixes: Vec<String>,
    pub procedure_suffixes: Vec<String>,
    pub suffix_exemptions: Vec<String>,
    pub code_exemptions: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_ngram: 2,
            max_ngram: 6,
            min_heuristic_words: 4,
            name_in_phrase_min_len: 5,
            phrase_in_name_min_len: 8,
            triggers: owned(vocabulary::MEDICAL_TRIGGERS),
            common_phrases: owned(vocabulary::COMMON_PHRASES),
            common_terms: owned(vocabulary::COMMON_CLINICAL_TERMS),
            diagnosis_suffixes: owned(vocabulary::DIAGNOSIS_SUFFIXES),
            medication_suffixes: owned(vocabulary::MEDICATION_SUFFIXES),
            procedure_suffixes: owned(vocabulary::PROCEDURE_SUFFIXES),
            suffix_exemptions: owned(vocabulary::SUFFIX_EXEMPTIONS),
            code_exemptions: owned(vocabulary::CODE_EXEMPTIONS),
        }
    }
}

/// Completeness checks flag narratives shorter than this (in characters)
/// when the record has discharge diagnoses.
pub const MIN_NARRATIVE_CHARS: usize = 100;

/// Retrieved passages are cut to this many characters inside prompts.
pub const PROMPT_CHUNK_MAX_CHARS: usize = 1_200;
