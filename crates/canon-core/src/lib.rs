pub mod types;
pub mod error;
pub mod key;
pub mod config;
pub mod vector;
pub mod strategy;
pub mod resolver;
pub mod rewriter;
pub mod stats;
pub mod dedup;

pub use error::{DedupError, Result};
pub use types::*;
pub use key::{canonical_key, label_key, KEY_SEPARATOR};
pub use config::{
    DedupConfig, EmbeddingsDistance, FuzzyDistance, Method, DEFAULT_MAX_DISTANCE,
    DEFAULT_PARALLEL_THRESHOLD,
};
pub use vector::{
    cosine_distance, euclidean_distance, embedding_input, vector_distance, EmbeddingService,
    LexicalEmbeddingService, DEFAULT_EMBEDDING_DIM,
};
#[cfg(feature = "fastembed")]
pub use vector::FastEmbedService;
pub use strategy::{
    string_distance, CancelHandle, EmbeddingsMatch, ExactMatch, FuzzyMatch, Interrupt,
    SimilarityStrategy,
};
pub use resolver::{resolve, CanonicalMap, Resolution};
pub use rewriter::{rewrite, Rewritten};
pub use stats::DedupStats;
pub use dedup::Deduplicator;
