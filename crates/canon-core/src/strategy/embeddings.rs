use super::{Interrupt, SimilarityStrategy};
use crate::config::{EmbeddingsDistance, Method, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::{DedupError, Result};
use crate::types::{Embedding, Entity};
use crate::vector::{embedding_input, vector_distance, EmbeddingService};
use std::sync::Arc;

#[cfg(feature = "embeddings")]
use rayon::prelude::*;

/// Embedding-distance matching on entity names.
pub struct EmbeddingsMatch {
    service: Arc<dyn EmbeddingService>,
    distance: EmbeddingsDistance,
    max_distance: f32,
    require_same_label: bool,
    parallel_threshold: usize,
}

impl EmbeddingsMatch {
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        distance: EmbeddingsDistance,
        max_distance: f32,
    ) -> Self {
        Self {
            service,
            distance,
            max_distance,
            require_same_label: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_require_same_label(mut self, require: bool) -> Self {
        self.require_same_label = require;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    pub fn embeddings_distance(&self) -> EmbeddingsDistance {
        self.distance
    }

    pub fn model_name(&self) -> &str {
        self.service.model_name()
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<()> {
        let expected = self.service.dimension();
        if embedding.is_empty() {
            return Err(DedupError::Provider(format!(
                "{} returned an empty embedding",
                self.service.model_name()
            )));
        }
        if embedding.len() != expected {
            return Err(DedupError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        if embedding.iter().all(|x| *x == 0.0) {
            return Err(DedupError::Provider(format!(
                "{} returned a zero vector",
                self.service.model_name()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EmbeddingsMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsMatch")
            .field("model", &self.service.model_name())
            .field("distance", &self.distance)
            .field("max_distance", &self.max_distance)
            .field("require_same_label", &self.require_same_label)
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

impl SimilarityStrategy for EmbeddingsMatch {
    type Signature = Embedding;

    fn method(&self) -> Method {
        Method::Embeddings
    }

    fn max_distance(&self) -> f32 {
        self.max_distance
    }

    fn require_same_label(&self) -> bool {
        self.require_same_label
    }

    fn signature(&self, entity: &Entity, interrupt: &Interrupt) -> Result<Embedding> {
        interrupt.check()?;
        let embedding = self.service.embed(&embedding_input(entity))?;
        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    /// One `embed_batch` call for the whole batch.
    fn signatures(&self, entities: &[&Entity], interrupt: &Interrupt) -> Result<Vec<Embedding>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        interrupt.check()?;

        let texts: Vec<String> = entities.iter().map(|e| embedding_input(e)).collect();
        let embeddings = self.service.embed_batch(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(DedupError::Provider(format!(
                "{} returned {} embeddings for {} texts",
                self.service.model_name(),
                embeddings.len(),
                texts.len()
            )));
        }
        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(embeddings)
    }

    fn distance(&self, a: &Embedding, b: &Embedding, interrupt: &Interrupt) -> Result<f32> {
        interrupt.check()?;
        if a.len() != b.len() {
            return Err(DedupError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(vector_distance(self.distance, a, b))
    }

    /// Signatures reaching this point were dimension-checked by
    /// `signature`, so the scan itself cannot fail.
    fn first_match(
        &self,
        candidate: &Embedding,
        representatives: &[&Embedding],
        interrupt: &Interrupt,
    ) -> Result<Option<usize>> {
        interrupt.check()?;
        Ok(self.scan(candidate, representatives))
    }
}

impl EmbeddingsMatch {
    fn is_match(&self, rep: &[f32], candidate: &[f32]) -> bool {
        vector_distance(self.distance, rep, candidate) <= self.max_distance
    }

    /// Large blocks are scanned in parallel; `position_first` keeps the
    /// result identical to the sequential scan.
    #[cfg(feature = "embeddings")]
    fn scan(&self, candidate: &Embedding, representatives: &[&Embedding]) -> Option<usize> {
        if representatives.len() >= self.parallel_threshold {
            representatives
                .par_iter()
                .position_first(|rep| self.is_match(rep, candidate))
        } else {
            representatives
                .iter()
                .position(|rep| self.is_match(rep, candidate))
        }
    }

    #[cfg(not(feature = "embeddings"))]
    fn scan(&self, candidate: &Embedding, representatives: &[&Embedding]) -> Option<usize> {
        representatives
            .iter()
            .position(|rep| self.is_match(rep, candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::vector::LexicalEmbeddingService;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed vector per name; unknown names fail.
    struct TableEmbedder {
        dimension: usize,
    }

    impl EmbeddingService for TableEmbedder {
        fn embed(&self, text: &str) -> Result<Embedding> {
            match text {
                "nyc" => Ok(vec![1.0, 0.0, 0.0]),
                "new york" => Ok(vec![0.9, 0.1, 0.0]),
                "boston" => Ok(vec![0.0, 1.0, 0.0]),
                "short" => Ok(vec![1.0]),
                "void" => Ok(vec![0.0, 0.0, 0.0]),
                other => Err(DedupError::Provider(format!("no vector for '{}'", other))),
            }
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    fn table_strategy(max_distance: f32) -> EmbeddingsMatch {
        EmbeddingsMatch::new(
            Arc::new(TableEmbedder { dimension: 3 }),
            EmbeddingsDistance::Cosine,
            max_distance,
        )
    }

    #[test]
    fn test_decide_with_cosine() {
        let strategy = table_strategy(0.1);
        let nyc = Entity::new("NYC", "City");
        let ny = Entity::new("New York", "City");
        let boston = Entity::new("Boston", "City");

        assert!(strategy.decide(&nyc, &ny).unwrap());
        assert!(!strategy.decide(&nyc, &boston).unwrap());
    }

    #[test]
    fn test_euclidean_threshold() {
        let strategy = EmbeddingsMatch::new(
            Arc::new(TableEmbedder { dimension: 3 }),
            EmbeddingsDistance::Euclidean,
            0.2,
        );
        assert!(strategy
            .decide(&Entity::new("nyc", "City"), &Entity::new("new york", "City"))
            .unwrap());
    }

    #[test]
    fn test_provider_error_propagates() {
        let strategy = table_strategy(0.5);
        let err = strategy
            .decide(&Entity::new("nyc", "City"), &Entity::new("Atlantis", "City"))
            .unwrap_err();
        match err {
            DedupError::Provider(msg) => assert!(msg.contains("atlantis")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let strategy = table_strategy(0.5);
        let err = strategy
            .signature(&Entity::new("short", "City"), &Interrupt::none())
            .unwrap_err();
        assert!(matches!(
            err,
            DedupError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_zero_vector_rejected() {
        let strategy = table_strategy(0.5);
        let err = strategy
            .signature(&Entity::new("void", "City"), &Interrupt::none())
            .unwrap_err();
        match err {
            DedupError::Provider(msg) => assert!(msg.contains("zero vector")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decide_respects_labels() {
        let strategy = table_strategy(0.1);
        let nyc = Entity::new("NYC", "City");
        let ny_team = Entity::new("New York", "Team");

        assert!(!strategy.decide(&nyc, &ny_team).unwrap());
        assert!(strategy
            .with_require_same_label(false)
            .decide(&nyc, &ny_team)
            .unwrap());
    }

    #[test]
    fn test_lexical_punctuation_names_not_merged() {
        let strategy = EmbeddingsMatch::new(
            Arc::new(LexicalEmbeddingService::new()),
            EmbeddingsDistance::Euclidean,
            0.01,
        );
        let input: Vec<Arc<Entity>> = ["???", "!!!", ""]
            .iter()
            .map(|name| Arc::new(Entity::new(*name, "Person")))
            .collect();

        let resolution = resolve(&input, &strategy, &Interrupt::none()).unwrap();
        assert_eq!(resolution.representatives().len(), 3);
    }

    /// Counts provider calls, delegating to the lexical embedder.
    struct CountingEmbedder {
        inner: LexicalEmbeddingService,
        single: AtomicUsize,
        batches: AtomicUsize,
        batched_texts: AtomicUsize,
    }

    impl EmbeddingService for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Embedding> {
            self.single.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.batched_texts.fetch_add(texts.len(), Ordering::SeqCst);
            texts.iter().map(|t| self.inner.embed(t)).collect()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    #[test]
    fn test_resolver_embeds_distinct_keys_in_one_batch() {
        let embedder = Arc::new(CountingEmbedder {
            inner: LexicalEmbeddingService::new(),
            single: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
            batched_texts: AtomicUsize::new(0),
        });
        let strategy = EmbeddingsMatch::new(embedder.clone(), EmbeddingsDistance::Cosine, 0.05);
        let input: Vec<Arc<Entity>> = [
            ("Ada Lovelace", "Person"),
            ("ADA LOVELACE", "person"),
            ("Alan Turing", "Person"),
            ("Grace Hopper", "Person"),
        ]
        .iter()
        .map(|(name, label)| Arc::new(Entity::new(*name, *label)))
        .collect();

        let resolution = resolve(&input, &strategy, &Interrupt::none()).unwrap();
        assert_eq!(resolution.representatives().len(), 3);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.batched_texts.load(Ordering::SeqCst), 3);
        assert_eq!(embedder.single.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parallel_scan_returns_first_match() {
        let strategy = EmbeddingsMatch::new(
            Arc::new(LexicalEmbeddingService::new()),
            EmbeddingsDistance::Cosine,
            0.01,
        )
        .with_parallel_threshold(1);

        let interrupt = Interrupt::none();
        let target = strategy
            .signature(&Entity::new("ada lovelace", "Person"), &interrupt)
            .unwrap();
        let other = strategy
            .signature(&Entity::new("alan turing", "Person"), &interrupt)
            .unwrap();

        let reps = vec![&other, &target, &other, &target];
        let found = strategy.first_match(&target, &reps, &interrupt).unwrap();
        assert_eq!(found, Some(1));
    }

    #[test]
    fn test_cancelled_before_provider_call() {
        let strategy = table_strategy(0.5);
        let handle = crate::strategy::CancelHandle::new();
        handle.cancel();
        let interrupt = Interrupt::new(Some(handle), None);

        let err = strategy
            .signature(&Entity::new("nyc", "City"), &interrupt)
            .unwrap_err();
        assert!(matches!(err, DedupError::Cancelled));
    }
}
