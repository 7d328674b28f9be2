use crate::config::{DedupConfig, Method};
use crate::error::{DedupError, Result};
use crate::resolver::{resolve, Resolution};
use crate::rewriter::rewrite;
use crate::stats::DedupStats;
use crate::strategy::{CancelHandle, EmbeddingsMatch, ExactMatch, FuzzyMatch, Interrupt};
use crate::types::{DedupInput, DedupOutput, Entity, EntityList, FactList};
use crate::vector::EmbeddingService;
use std::sync::Arc;
use std::time::Instant;

enum Strategy {
    Exact(ExactMatch),
    Fuzzy(FuzzyMatch),
    Embeddings(EmbeddingsMatch),
}

/// Entry point: validates a configuration once, then deduplicates entity or
/// fact batches. Holds no state between calls.
pub struct Deduplicator {
    config: DedupConfig,
    strategy: Strategy,
    cancel: Option<CancelHandle>,
}

impl Deduplicator {
    /// Build a deduplicator, failing fast on an invalid configuration.
    ///
    /// `embeddings` is required when `config.method` is
    /// [`Method::Embeddings`] and ignored otherwise.
    pub fn new(config: DedupConfig, embeddings: Option<Arc<dyn EmbeddingService>>) -> Result<Self> {
        config.validate()?;

        let strategy = match config.method {
            Method::ExactMatch => Strategy::Exact(ExactMatch::new()),
            Method::Fuzzy => {
                let distance = config.fuzzy_distance.ok_or_else(|| {
                    DedupError::Configuration("fuzzy distance not provided".to_string())
                })?;
                Strategy::Fuzzy(
                    FuzzyMatch::new(distance, config.max_distance)
                        .with_require_same_label(config.require_same_label),
                )
            }
            Method::Embeddings => {
                let distance = config.embeddings_distance.ok_or_else(|| {
                    DedupError::Configuration("embeddings distance not provided".to_string())
                })?;
                let service = embeddings.ok_or_else(|| {
                    DedupError::Configuration(
                        "embeddings provider not provided for the embeddings method".to_string(),
                    )
                })?;
                Strategy::Embeddings(
                    EmbeddingsMatch::new(service, distance, config.max_distance)
                        .with_require_same_label(config.require_same_label)
                        .with_parallel_threshold(config.parallel_threshold),
                )
            }
        };

        Ok(Self {
            config,
            strategy,
            cancel: None,
        })
    }

    /// Exact-match deduplicator. Cannot fail.
    pub fn exact() -> Self {
        Self {
            config: DedupConfig::exact(),
            strategy: Strategy::Exact(ExactMatch::new()),
            cancel: None,
        }
    }

    /// Attach a handle that can cancel in-flight fuzzy/embedding calls.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn method(&self) -> Method {
        self.config.method
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub fn deduplicate(&self, input: DedupInput) -> Result<DedupOutput> {
        self.deduplicate_with_stats(input).map(|(output, _)| output)
    }

    /// Deduplicate and report what happened.
    pub fn deduplicate_with_stats(&self, input: DedupInput) -> Result<(DedupOutput, DedupStats)> {
        let start = Instant::now();
        let mut stats = DedupStats::new(self.method());

        let output = match input {
            DedupInput::Entities(list) => {
                let resolution = self.resolve(list.iter())?;
                Self::record(&mut stats, &resolution);
                DedupOutput::Entities(resolution.to_entity_list())
            }
            DedupInput::Facts(list) => {
                let resolution = self.resolve(list.endpoints())?;
                let rewritten = rewrite(&list, &resolution.canonical_map);
                Self::record(&mut stats, &resolution);
                stats.facts = rewritten.facts.len() as u64;
                stats.endpoints_rewired = rewritten.endpoints_rewired as u64;
                DedupOutput::Facts(rewritten.facts)
            }
        };

        stats.duration = start.elapsed();
        log::info!("{}", stats.summary());
        Ok((output, stats))
    }

    pub fn deduplicate_entities(&self, entities: &EntityList) -> Result<EntityList> {
        Ok(self.resolve(entities.iter())?.to_entity_list())
    }

    pub fn deduplicate_facts(&self, facts: &FactList) -> Result<FactList> {
        let resolution = self.resolve(facts.endpoints())?;
        Ok(rewrite(facts, &resolution.canonical_map).facts)
    }

    /// Run the configured strategy over `entities`.
    pub fn resolve<'a, I>(&self, entities: I) -> Result<Resolution>
    where
        I: IntoIterator<Item = &'a Arc<Entity>>,
    {
        let interrupt = Interrupt::new(self.cancel.clone(), self.config.timeout());

        match &self.strategy {
            Strategy::Exact(strategy) => resolve(entities, strategy, &Interrupt::none()),
            Strategy::Fuzzy(strategy) => {
                if !cfg!(feature = "fuzzy") {
                    return Err(DedupError::NotImplemented {
                        method: Method::Fuzzy,
                    });
                }
                resolve(entities, strategy, &interrupt)
            }
            Strategy::Embeddings(strategy) => {
                if !cfg!(feature = "embeddings") {
                    return Err(DedupError::NotImplemented {
                        method: Method::Embeddings,
                    });
                }
                resolve(entities, strategy, &interrupt)
            }
        }
    }

    fn record(stats: &mut DedupStats, resolution: &Resolution) {
        stats.entities_in = resolution.assignments.len() as u64;
        stats.entities_out = resolution.representatives().len() as u64;
        stats.duplicates_merged = resolution.merged() as u64;
        stats.comparisons = resolution.comparisons;
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::exact()
    }
}

impl std::fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("config", &self.config)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingsDistance, FuzzyDistance};
    use crate::types::Fact;
    use crate::vector::LexicalEmbeddingService;

    fn city(name: &str) -> Entity {
        Entity::new(name, "City")
    }

    fn entity_names(list: &EntityList) -> Vec<&str> {
        list.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_exact_entities() {
        let dedup = Deduplicator::exact();
        let input = EntityList::from(vec![city("Paris"), city("Paris"), city("London")]);

        let output = dedup.deduplicate(input.into()).unwrap();
        let list = output.into_entities().unwrap();
        assert_eq!(entity_names(&list), vec!["Paris", "London"]);
    }

    #[test]
    fn test_exact_facts_share_representative() {
        let dedup = Deduplicator::exact();
        let facts = FactList::from(vec![
            Fact::new(city("Paris"), "capitalOf", Entity::new("France", "Country")),
            Fact::new(city("paris"), "hasPopulation", Entity::new("2M", "Quantity")),
        ]);

        let output = dedup.deduplicate_facts(&facts).unwrap();
        assert_eq!(output.len(), 2);
        assert!(Arc::ptr_eq(&output.facts[0].subject, &output.facts[1].subject));
        assert_eq!(output.facts[1].subject.name, "Paris");
        assert_eq!(output.facts[1].predicate, "hasPopulation");
    }

    #[test]
    fn test_embeddings_requires_distance() {
        let config = DedupConfig::new().with_method(Method::Embeddings);
        let provider: Arc<dyn EmbeddingService> = Arc::new(LexicalEmbeddingService::new());

        let err = Deduplicator::new(config, Some(provider)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_embeddings_requires_provider() {
        let config = DedupConfig::embeddings(EmbeddingsDistance::Cosine);
        let err = Deduplicator::new(config, None).unwrap_err();
        assert!(err.is_configuration());
        assert!(format!("{}", err).contains("provider"));
    }

    #[test]
    fn test_fuzzy_requires_distance() {
        let config = DedupConfig::new().with_method(Method::Fuzzy);
        assert!(Deduplicator::new(config, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_provider_ignored_for_exact() {
        let provider: Arc<dyn EmbeddingService> = Arc::new(LexicalEmbeddingService::new());
        let dedup = Deduplicator::new(DedupConfig::exact(), Some(provider)).unwrap();
        assert_eq!(dedup.method(), Method::ExactMatch);
    }

    #[test]
    #[cfg(feature = "fuzzy")]
    fn test_fuzzy_entities() {
        let config = DedupConfig::fuzzy(FuzzyDistance::TokenSort).with_max_distance(0.1);
        let dedup = Deduplicator::new(config, None).unwrap();
        let input = EntityList::from(vec![
            Entity::new("Ada Lovelace", "Person"),
            Entity::new("Lovelace Ada", "Person"),
            Entity::new("Alan Turing", "Person"),
        ]);

        let list = dedup.deduplicate_entities(&input).unwrap();
        assert_eq!(entity_names(&list), vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    #[cfg(not(feature = "fuzzy"))]
    fn test_fuzzy_not_available() {
        let config = DedupConfig::fuzzy(FuzzyDistance::TokenSort);
        let dedup = Deduplicator::new(config, None).unwrap();
        let input = EntityList::from(vec![city("Paris")]);

        let err = dedup.deduplicate(input.clone().into()).unwrap_err();
        assert!(matches!(
            err,
            DedupError::NotImplemented {
                method: Method::Fuzzy
            }
        ));
        assert_eq!(input.len(), 1);
    }

    #[test]
    #[cfg(feature = "embeddings")]
    fn test_embeddings_entities() {
        let provider: Arc<dyn EmbeddingService> = Arc::new(LexicalEmbeddingService::new());
        let config = DedupConfig::embeddings(EmbeddingsDistance::Cosine).with_max_distance(0.05);
        let dedup = Deduplicator::new(config, Some(provider)).unwrap();
        let input = EntityList::from(vec![
            city("New York"),
            city("new-york"),
            city("Boston"),
        ]);

        let list = dedup.deduplicate_entities(&input).unwrap();
        assert_eq!(entity_names(&list), vec!["New York", "Boston"]);
    }

    #[test]
    #[cfg(feature = "fuzzy")]
    fn test_cancelled_before_call() {
        let handle = CancelHandle::new();
        let dedup = Deduplicator::new(DedupConfig::fuzzy(FuzzyDistance::SimpleRatio), None)
            .unwrap()
            .with_cancel_handle(handle.clone());
        handle.cancel();

        let input = EntityList::from(vec![city("Paris"), city("Parys")]);
        let err = dedup.deduplicate_entities(&input).unwrap_err();
        assert!(matches!(err, DedupError::Cancelled));
    }

    #[test]
    fn test_exact_ignores_cancellation() {
        let handle = CancelHandle::new();
        handle.cancel();
        let dedup = Deduplicator::exact().with_cancel_handle(handle);

        let input = EntityList::from(vec![city("Paris"), city("paris")]);
        assert_eq!(dedup.deduplicate_entities(&input).unwrap().len(), 1);
    }

    #[test]
    fn test_stats_for_facts() {
        let dedup = Deduplicator::exact();
        let facts = FactList::from(vec![
            Fact::new(city("Paris"), "capitalOf", Entity::new("France", "Country")),
            Fact::new(city("PARIS"), "partOf", Entity::new("france", "country")),
        ]);

        let (_, stats) = dedup.deduplicate_with_stats(facts.into()).unwrap();
        assert_eq!(stats.entities_in, 4);
        assert_eq!(stats.entities_out, 2);
        assert_eq!(stats.duplicates_merged, 2);
        assert_eq!(stats.facts, 2);
        assert_eq!(stats.endpoints_rewired, 2);
    }
}
