//! Deterministic lexical embedding.
//!
//! Feature hashing over lowercased word tokens, L2-normalised. Not a neural
//! model: names sharing words land close together, synonyms do not. Useful
//! offline and as a reproducible baseline for the embeddings strategy.
//! Texts without word tokens are hashed whole, so no text maps to the zero
//! vector.

use super::embedding::EmbeddingService;
use crate::error::{DedupError, Result};
use crate::types::Embedding;
use blake3::Hasher;

/// Default embedding dimensionality for lexical embeddings.
pub const DEFAULT_EMBEDDING_DIM: usize = 64;

/// Offline embedding service built on token hashing.
#[derive(Debug, Clone)]
pub struct LexicalEmbeddingService {
    dimension: usize,
    model_name: String,
}

impl LexicalEmbeddingService {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_EMBEDDING_DIM)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("lexical-{}", dimension),
        }
    }
}

impl Default for LexicalEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for LexicalEmbeddingService {
    fn embed(&self, text: &str) -> Result<Embedding> {
        if self.dimension == 0 {
            return Err(DedupError::Provider(
                "lexical embedding dimension must be > 0".to_string(),
            ));
        }
        Ok(lexical_embedding(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Stands in for the empty string so it still gets a non-zero vector.
const EMPTY_TEXT: &str = "\u{0}empty";

/// Hashed features per text when it has no word tokens.
const WHOLE_TEXT_FEATURES: u8 = 4;

fn lexical_embedding(text: &str, dim: usize) -> Embedding {
    let mut vec = vec![0.0f32; dim];
    let lowered = text.to_lowercase();

    for token in tokenize(&lowered) {
        let (idx, negative) = bucket(&[token.as_bytes()], dim);
        vec[idx] += if negative { -1.0 } else { 1.0 };
    }

    // No tokens ("", "???"), or signed features cancelled out: hash the
    // whole text instead. All-positive features never sum to zero.
    if vec.iter().all(|x| *x == 0.0) {
        let whole = if lowered.is_empty() { EMPTY_TEXT } else { lowered.as_str() };
        for seed in 0..WHOLE_TEXT_FEATURES {
            let (idx, _) = bucket(&[&[seed][..], whole.as_bytes()], dim);
            vec[idx] += 1.0;
        }
    }

    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut vec {
        *x /= norm;
    }

    vec
}

fn bucket(parts: &[&[u8]], dim: usize) -> (usize, bool) {
    let mut h = Hasher::new();
    for part in parts {
        h.update(part);
    }
    let hash = h.finalize();
    let bytes = hash.as_bytes();

    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    let idx = (u64::from_le_bytes(head) % dim as u64) as usize;
    (idx, bytes[8] & 1 == 1)
}
