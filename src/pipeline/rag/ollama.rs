//! Blocking Ollama client serving both generation and embeddings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::RagError;
use super::types::LlmGenerate;
use crate::config::OllamaSettings;
use crate::pipeline::storage::types::EmbeddingModel;
use crate::pipeline::storage::StorageError;
use crate::pipeline_config::GenerationConfig;

/// Ollama HTTP client for local generation and embedding.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    settings: OllamaSettings,
}

impl OllamaClient {
    pub fn new(settings: &OllamaSettings) -> Result<Self, RagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RagError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            settings: settings.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RagError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().map_err(|e| {
            if e.is_connect() {
                RagError::OllamaConnection(self.base_url.clone())
            } else if e.is_timeout() {
                RagError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.settings.timeout_secs
                ))
            } else {
                RagError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))
    }

    fn embed_prefixed(&self, prefix: &str, text: &str) -> Result<Vec<f32>, StorageError> {
        let input = format!("{prefix}{text}");
        let body = EmbedRequest {
            model: &self.settings.embed_model,
            input: &input,
        };
        let parsed: EmbedResponse = self.post("/api/embed", &body).map_err(|e| match e {
            RagError::OllamaConnection(url) => StorageError::EmbeddingConnection(url),
            other => StorageError::Embedding(other.to_string()),
        })?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::Embedding("Empty embeddings array".to_string()))
    }
}

/// Ollama `options` subset driven by [`GenerationConfig`].
#[derive(Debug, Serialize, PartialEq)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
}

impl From<&GenerationConfig> for GenerateOptions {
    fn from(cfg: &GenerationConfig) -> Self {
        Self {
            num_predict: cfg.max_new_tokens,
            // greedy decoding
            temperature: if cfg.sample { cfg.temperature } else { 0.0 },
            top_p: cfg.top_p,
            repeat_penalty: cfg.repetition_penalty,
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for Ollama /api/embed
#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body from Ollama /api/embed
#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl LlmGenerate for OllamaClient {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, RagError> {
        let body = GenerateRequest {
            model: &self.settings.generate_model,
            prompt,
            stream: false,
            options: GenerateOptions::from(config),
        };
        let parsed: GenerateResponse = self
            .post("/api/generate", &body)
            .map_err(|e| RagError::GenerationFailed(e.to_string()))?;
        Ok(parsed.response.trim().to_string())
    }
}

impl EmbeddingModel for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.embed_prefixed("", text)
    }

    fn dimension(&self) -> usize {
        self.settings.embedding_dim
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.embed_prefixed(&self.settings.query_prefix, text)
    }

    fn embed_passage(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.embed_prefixed(&self.settings.passage_prefix, text)
    }
}
