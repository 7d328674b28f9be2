use crate::error::Result;
use crate::types::{Embedding, Entity};

#[cfg(feature = "fastembed")]
use crate::error::DedupError;
#[cfg(feature = "fastembed")]
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding as FastEmbedModel};

/// Service for generating text embeddings
pub trait EmbeddingService: Send + Sync {
    /// Generate embedding for a single text.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Batch embedding for efficiency.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension for the current model.
    fn dimension(&self) -> usize;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

/// FastEmbed-based embedding service
#[cfg(feature = "fastembed")]
pub struct FastEmbedService {
    model: FastEmbedModel,
    model_name: String,
    dimension: usize,
}

#[cfg(feature = "fastembed")]
impl FastEmbedService {
    /// Create a new FastEmbed service with the default model
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::BGESmallENV15)
    }

    /// Create a new FastEmbed service with a specific model
    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        let init_options = InitOptions::new(model.clone());

        let fastembed_model = FastEmbedModel::try_new(init_options)
            .map_err(|e| DedupError::Provider(format!("Failed to initialize FastEmbed: {}", e)))?;

        let model_name = format!("{:?}", model);
        let dimension = match model {
            EmbeddingModel::BGESmallENV15 => 384,
            EmbeddingModel::BGEBaseENV15 => 768,
            EmbeddingModel::BGELargeENV15 => 1024,
            EmbeddingModel::AllMiniLML6V2 => 384,
            EmbeddingModel::AllMiniLML12V2 => 384,
            _ => 384,
        };

        Ok(Self {
            model: fastembed_model,
            model_name,
            dimension,
        })
    }
}

#[cfg(feature = "fastembed")]
impl EmbeddingService for FastEmbedService {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| DedupError::Provider(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DedupError::Provider("No embedding generated".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| DedupError::Provider(format!("Batch embedding failed: {}", e)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl<E: EmbeddingService + ?Sized> EmbeddingService for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).embed_batch(texts)
    }
    fn dimension(&self) -> usize {
        (**self).dimension()
    }
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Text embedded for an entity: its lowercased name.
///
/// Labels are not embedded; label agreement is handled by blocking.
pub fn embedding_input(entity: &Entity) -> String {
    entity.name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_input_is_lowercased_name() {
        let entity = Entity::new("New York", "City").with_description("A big city");
        assert_eq!(embedding_input(&entity), "new york");
    }

    #[test]
    #[cfg(feature = "fastembed")]
    #[ignore] // Requires downloading model
    fn test_fastembed_service() {
        let service = FastEmbedService::new().unwrap();

        assert_eq!(service.dimension(), 384);

        let embedding = service.embed("Paris").unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[test]
    #[cfg(feature = "fastembed")]
    #[ignore] // Requires downloading model
    fn test_similar_names_are_close() {
        let service = FastEmbedService::new().unwrap();

        let a = service.embed("new york city").unwrap();
        let b = service.embed("new york").unwrap();

        let distance = crate::vector::cosine_distance(&a, &b);
        assert!(distance < 0.3, "Similar names should be close: {}", distance);
    }
}
