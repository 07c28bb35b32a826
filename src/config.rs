//! TOML configuration.
//!
//! Every section except `[db]` has defaults, so a minimal file is:
//!
//! ```toml
//! [db]
//! path = "./data/review.sqlite"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// SQLite file holding the persisted index. One index per file.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// Split preference, highest priority first. `""` means "split anywhere".
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            separators: default_separators(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_overlap() -> usize {
    50
}
fn default_separators() -> Vec<String> {
    vec![
        "\n\n".to_string(),
        "\n".to_string(),
        ". ".to_string(),
        String::new(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplianceConfig {
    /// Minimum cosine similarity for a checklist entry to count as found.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Checklist applied on every ingest. The embedded default is used when unset.
    #[serde(default)]
    pub default_checklist: Option<PathBuf>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            default_checklist: None,
        }
    }
}

fn default_threshold() -> f32 {
    0.7
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Upper bound on chunks sent through the language model per ingest.
    #[serde(default = "default_max_clauses")]
    pub max_clauses: usize,
    /// Retrieval probe used to pick the chunks to analyze.
    #[serde(default = "default_probe")]
    pub probe: String,
    /// Chunks analyzed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_clauses: default_max_clauses(),
            probe: default_probe(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_clauses() -> usize {
    10
}
fn default_probe() -> String {
    "all clauses in the document".to_string()
}
fn default_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override for the `openai` and `ollama` providers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-request deadline; 0 disables it.
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// `disabled`, `openai` (any OpenAI-compatible chat endpoint) or `ollama`.
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override, e.g. `https://openrouter.ai/api/v1`.
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    /// Per-call deadline. A call that exceeds it counts as a failed step;
    /// 0 disables it.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            url: None,
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_provider() -> String {
    "disabled".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl EmbeddingConfig {
    /// Providers that call out to a model server and must be told the vector size.
    pub fn requires_dims(&self) -> bool {
        matches!(self.provider.as_str(), "openai" | "ollama")
    }
}

impl Config {
    /// All-defaults configuration pointing at `db_path`.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            chunking: ChunkingConfig::default(),
            compliance: ComplianceConfig::default(),
            analysis: AnalysisConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            bail!("chunking.overlap must be smaller than chunking.chunk_size");
        }
        if self.chunking.separators.is_empty() {
            bail!("chunking.separators must not be empty");
        }

        if !(-1.0..=1.0).contains(&self.compliance.threshold) {
            bail!("compliance.threshold must be in [-1.0, 1.0]");
        }

        if self.analysis.max_clauses == 0 {
            bail!("analysis.max_clauses must be >= 1");
        }
        if self.analysis.concurrency == 0 {
            bail!("analysis.concurrency must be >= 1");
        }

        match self.embedding.provider.as_str() {
            "hash" | "openai" | "ollama" | "local" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be hash, openai, ollama, or local.",
                other
            ),
        }
        if self.embedding.requires_dims() {
            if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be >= 1");
        }

        match self.llm.provider.as_str() {
            "disabled" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be disabled, openai, or ollama.",
                other
            ),
        }
        if self.llm.provider != "disabled" && self.llm.model.is_none() {
            bail!(
                "llm.model must be specified when provider is '{}'",
                self.llm.provider
            );
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_gets_defaults() {
        let config: Config = toml::from_str("[db]\npath = \"review.sqlite\"\n").unwrap();
        config.validate().unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.chunking.separators, vec!["\n\n", "\n", ". ", ""]);
        assert!((config.compliance.threshold - 0.7).abs() < 1e-6);
        assert_eq!(config.analysis.max_clauses, 10);
        assert_eq!(config.embedding.provider, "hash");
        assert_eq!(config.llm.provider, "disabled");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::minimal("x.sqlite");
        config.chunking.overlap = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_range() {
        let mut config = Config::minimal("x.sqlite");
        config.compliance.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_openai_embedding_needs_dims() {
        let mut config = Config::minimal("x.sqlite");
        config.embedding.provider = "openai".to_string();
        config.embedding.model = Some("text-embedding-3-small".to_string());
        assert!(config.validate().is_err());
        config.embedding.dims = Some(1536);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_llm_provider_rejected() {
        let mut config = Config::minimal("x.sqlite");
        config.llm.provider = "gemini".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("review.toml");
        std::fs::write(
            &path,
            "[db]\npath = \"idx.sqlite\"\n\n[chunking]\nchunk_size = 200\noverlap = 20\n\n[compliance]\nthreshold = 0.8\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 200);
        assert!((config.compliance.threshold - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../config/review.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }
}
