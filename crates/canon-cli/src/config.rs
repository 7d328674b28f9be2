use anyhow::{Context, Result};
use canon_core::{
    DedupConfig, EmbeddingService, LexicalEmbeddingService, Method, DEFAULT_EMBEDDING_DIM,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Contents of canon.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    pub dedup: DedupConfig,
    pub embeddings: EmbeddingsConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// Offline token-hash embeddings.
    #[default]
    Lexical,
    /// FastEmbed model. Needs the `fastembed` feature and a model download.
    Fastembed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProvider,

    /// Vector size for the lexical provider.
    pub dimension: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Lexical,
            dimension: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl CanonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Defaults when the file is missing, errors when it exists but is bad.
    pub fn load_if_present(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// All problems found, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.dedup.validate() {
            errors.push(format!("[dedup] {}", e));
        }

        if self.embeddings.provider == EmbeddingProvider::Lexical && self.embeddings.dimension == 0 {
            errors.push("[embeddings] dimension must be > 0".to_string());
        }

        if self.embeddings.provider == EmbeddingProvider::Fastembed && !cfg!(feature = "fastembed") {
            errors.push(
                "[embeddings] provider \"fastembed\" needs canon built with --features fastembed"
                    .to_string(),
            );
        }

        errors
    }

    /// One-line description of the effective matching setup.
    pub fn summary(&self) -> String {
        let dedup = &self.dedup;
        let mut line = format!("method: {}", dedup.method);
        match dedup.method {
            Method::ExactMatch => return line,
            Method::Fuzzy => {
                if let Some(distance) = dedup.fuzzy_distance {
                    line.push_str(&format!(" ({})", distance));
                }
            }
            Method::Embeddings => {
                if let Some(distance) = dedup.embeddings_distance {
                    line.push_str(&format!(" ({})", distance));
                }
                line.push_str(&format!(", provider: {}", self.provider_name()));
            }
        }
        line.push_str(&format!(", max_distance: {}", dedup.max_distance));
        if !dedup.require_same_label {
            line.push_str(", across labels");
        }
        line
    }

    fn provider_name(&self) -> String {
        match self.embeddings.provider {
            EmbeddingProvider::Lexical => format!("lexical-{}", self.embeddings.dimension),
            EmbeddingProvider::Fastembed => "fastembed".to_string(),
        }
    }

    pub fn embedding_service(&self) -> Result<Arc<dyn EmbeddingService>> {
        match self.embeddings.provider {
            EmbeddingProvider::Lexical => Ok(Arc::new(LexicalEmbeddingService::with_dimension(
                self.embeddings.dimension,
            ))),
            EmbeddingProvider::Fastembed => fastembed_service(),
        }
    }
}

#[cfg(feature = "fastembed")]
fn fastembed_service() -> Result<Arc<dyn EmbeddingService>> {
    tracing::info!("Loading embedding model...");
    let service = canon_core::FastEmbedService::new()?;
    tracing::info!("Embedding model loaded: {}", service.model_name());
    Ok(Arc::new(service))
}

#[cfg(not(feature = "fastembed"))]
fn fastembed_service() -> Result<Arc<dyn EmbeddingService>> {
    anyhow::bail!("provider \"fastembed\" needs canon built with --features fastembed")
}
