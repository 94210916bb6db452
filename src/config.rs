use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "Epicrisis";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_GENERATE_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_EMBED_MODEL: &str = "multilingual-e5-small";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "epicrisis_lib=info,warn"
}

/// Install the global `tracing` subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::debug!("{APP_NAME} v{APP_VERSION} tracing initialized");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown backend '{0}' (expected 'ollama' or 'template')")]
    UnknownBackend(String),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

// ═══════════════════════════════════════════════════════════
// Backend selection
// ═══════════════════════════════════════════════════════════

/// Connection details for a local Ollama server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub generate_model: String,
    pub embed_model: String,
    pub timeout_secs: u64,
    pub embedding_dim: usize,
    /// Prepended to questions before embedding (e5 convention).
    pub query_prefix: String,
    /// Prepended to stored passages before embedding.
    pub passage_prefix: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            embedding_dim: 384,
            query_prefix: "query: ".to_string(),
            passage_prefix: "passage: ".to_string(),
        }
    }
}

/// Which narrator writes the discharge text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Ollama(OllamaSettings),
    /// Deterministic rendering of the record, no model involved.
    Template,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Ollama(OllamaSettings::default())
    }
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub backend: BackendConfig,
}

impl Settings {
    /// Read `EPICRISIS_BACKEND`, `EPICRISIS_OLLAMA_URL`,
    /// `EPICRISIS_GENERATE_MODEL`, `EPICRISIS_EMBED_MODEL` and
    /// `EPICRISIS_TIMEOUT_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("EPICRISIS_BACKEND").as_deref().map(str::trim) {
            None => "ollama".to_string(),
            Some(v) => v.to_lowercase(),
        };

        let backend = match backend.as_str() {
            "template" => BackendConfig::Template,
            "ollama" => {
                let mut ollama = OllamaSettings::default();
                if let Some(url) = get("EPICRISIS_OLLAMA_URL") {
                    ollama.base_url = url.trim().trim_end_matches('/').to_string();
                }
                if let Some(model) = get("EPICRISIS_GENERATE_MODEL") {
                    ollama.generate_model = model.trim().to_string();
                }
                if let Some(model) = get("EPICRISIS_EMBED_MODEL") {
                    ollama.embed_model = model.trim().to_string();
                }
                if let Some(raw) = get("EPICRISIS_TIMEOUT_SECS") {
                    ollama.timeout_secs =
                        raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                            var: "EPICRISIS_TIMEOUT_SECS",
                            value: raw.clone(),
                        })?;
                }
                BackendConfig::Ollama(ollama)
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self { backend })
    }
}
