use crate::error::{DedupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default maximum distance for fuzzy and embedding matching.
pub const DEFAULT_MAX_DISTANCE: f32 = 0.7;

/// Default label-block size from which embedding scans run in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// How entities are matched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Lowercased name + label equality.
    #[default]
    ExactMatch,
    /// Distance between embedding vectors of entity names.
    Embeddings,
    /// String distance between entity names.
    Fuzzy,
}

/// Vector distance used by the embeddings strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingsDistance {
    /// `1 - cosine_similarity`, in `[0, 2]`.
    Cosine,
    /// L2 norm of the difference.
    Euclidean,
}

/// String distance used by the fuzzy strategy. All produce values in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyDistance {
    /// Levenshtein ratio after sorting whitespace-separated tokens.
    TokenSort,
    /// Best Levenshtein ratio of the shorter name against any window of the longer.
    PartialRatio,
    /// Plain normalized Levenshtein ratio.
    SimpleRatio,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::ExactMatch => "exact_match",
            Method::Embeddings => "embeddings",
            Method::Fuzzy => "fuzzy",
        }
    }
}

impl EmbeddingsDistance {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingsDistance::Cosine => "cosine",
            EmbeddingsDistance::Euclidean => "euclidean",
        }
    }
}

impl FuzzyDistance {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuzzyDistance::TokenSort => "token_sort",
            FuzzyDistance::PartialRatio => "partial_ratio",
            FuzzyDistance::SimpleRatio => "simple_ratio",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EmbeddingsDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FuzzyDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact_match" | "exact" => Ok(Method::ExactMatch),
            "embeddings" => Ok(Method::Embeddings),
            "fuzzy" => Ok(Method::Fuzzy),
            other => Err(DedupError::Configuration(format!(
                "invalid method '{}', should be exact_match, embeddings or fuzzy",
                other
            ))),
        }
    }
}

impl FromStr for EmbeddingsDistance {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine" => Ok(EmbeddingsDistance::Cosine),
            "euclidean" => Ok(EmbeddingsDistance::Euclidean),
            other => Err(DedupError::Configuration(format!(
                "invalid embeddings distance '{}', should be cosine or euclidean",
                other
            ))),
        }
    }
}

impl FromStr for FuzzyDistance {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "token_sort" => Ok(FuzzyDistance::TokenSort),
            "partial_ratio" => Ok(FuzzyDistance::PartialRatio),
            "simple_ratio" => Ok(FuzzyDistance::SimpleRatio),
            other => Err(DedupError::Configuration(format!(
                "invalid fuzzy distance '{}', should be token_sort, partial_ratio or simple_ratio",
                other
            ))),
        }
    }
}

/// Parameters for a [`crate::Deduplicator`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DedupConfig {
    /// Matching method. Default: exact_match.
    pub method: Method,

    /// Required when `method = embeddings`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings_distance: Option<EmbeddingsDistance>,

    /// Required when `method = fuzzy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_distance: Option<FuzzyDistance>,

    /// Pairs at or below this distance are the same entity. Default: 0.7.
    /// Ignored by exact matching.
    pub max_distance: f32,

    /// Only compare entities whose labels match case-insensitively.
    /// Default: true.
    pub require_same_label: bool,

    /// Per-call budget for fuzzy and embedding matching, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Label blocks with at least this many representatives are scanned
    /// in parallel by the embeddings strategy. Default: 512.
    pub parallel_threshold: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            method: Method::ExactMatch,
            embeddings_distance: None,
            fuzzy_distance: None,
            max_distance: DEFAULT_MAX_DISTANCE,
            require_same_label: true,
            timeout_ms: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl DedupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact() -> Self {
        Self::default()
    }

    pub fn fuzzy(distance: FuzzyDistance) -> Self {
        Self::default()
            .with_method(Method::Fuzzy)
            .with_fuzzy_distance(distance)
    }

    pub fn embeddings(distance: EmbeddingsDistance) -> Self {
        Self::default()
            .with_method(Method::Embeddings)
            .with_embeddings_distance(distance)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_embeddings_distance(mut self, distance: EmbeddingsDistance) -> Self {
        self.embeddings_distance = Some(distance);
        self
    }

    pub fn with_fuzzy_distance(mut self, distance: FuzzyDistance) -> Self {
        self.fuzzy_distance = Some(distance);
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_require_same_label(mut self, require: bool) -> Self {
        self.require_same_label = require;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Check the parameters the chosen method needs.
    ///
    /// The embedding provider is checked separately by
    /// [`crate::Deduplicator::new`] since it is not part of the config.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            Method::ExactMatch => {}
            Method::Embeddings => {
                if self.embeddings_distance.is_none() {
                    return Err(DedupError::Configuration(
                        "embeddings distance not provided, should be cosine or euclidean"
                            .to_string(),
                    ));
                }
            }
            Method::Fuzzy => {
                if self.fuzzy_distance.is_none() {
                    return Err(DedupError::Configuration(
                        "fuzzy distance not provided, should be token_sort, partial_ratio or simple_ratio"
                            .to_string(),
                    ));
                }
            }
        }

        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(DedupError::Configuration(format!(
                "max_distance must be a finite, non-negative number (got {})",
                self.max_distance
            )));
        }

        if self.parallel_threshold == 0 {
            return Err(DedupError::Configuration(
                "parallel_threshold must be > 0".to_string(),
            ));
        }

        if self.timeout_ms == Some(0) {
            return Err(DedupError::Configuration(
                "timeout_ms must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
