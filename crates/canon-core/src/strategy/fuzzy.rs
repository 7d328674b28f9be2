use super::{Interrupt, SimilarityStrategy};
use crate::config::{FuzzyDistance, Method};
use crate::error::Result;
use crate::types::Entity;

#[cfg(not(feature = "fuzzy"))]
use crate::error::DedupError;

/// String-distance matching on entity names.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    distance: FuzzyDistance,
    max_distance: f32,
    require_same_label: bool,
}

impl FuzzyMatch {
    pub fn new(distance: FuzzyDistance, max_distance: f32) -> Self {
        Self {
            distance,
            max_distance,
            require_same_label: true,
        }
    }

    pub fn with_require_same_label(mut self, require: bool) -> Self {
        self.require_same_label = require;
        self
    }

    pub fn fuzzy_distance(&self) -> FuzzyDistance {
        self.distance
    }
}

impl SimilarityStrategy for FuzzyMatch {
    /// Name normalised for the configured distance.
    type Signature = String;

    fn method(&self) -> Method {
        Method::Fuzzy
    }

    fn max_distance(&self) -> f32 {
        self.max_distance
    }

    fn require_same_label(&self) -> bool {
        self.require_same_label
    }

    fn signature(&self, entity: &Entity, _interrupt: &Interrupt) -> Result<String> {
        Ok(normalize(self.distance, &entity.name))
    }

    fn distance(&self, a: &String, b: &String, interrupt: &Interrupt) -> Result<f32> {
        interrupt.check()?;
        normalized_distance(self.distance, a, b)
    }
}

/// Distance in `[0, 1]` between two raw names. 0 means identical.
pub fn string_distance(kind: FuzzyDistance, a: &str, b: &str) -> Result<f32> {
    normalized_distance(kind, &normalize(kind, a), &normalize(kind, b))
}

fn normalize(kind: FuzzyDistance, name: &str) -> String {
    let lowered = name.to_lowercase();
    match kind {
        FuzzyDistance::TokenSort => {
            let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
            tokens.sort_unstable();
            tokens.join(" ")
        }
        FuzzyDistance::PartialRatio | FuzzyDistance::SimpleRatio => lowered,
    }
}

#[cfg(feature = "fuzzy")]
fn normalized_distance(kind: FuzzyDistance, a: &str, b: &str) -> Result<f32> {
    let similarity = match kind {
        FuzzyDistance::TokenSort | FuzzyDistance::SimpleRatio => {
            strsim::normalized_levenshtein(a, b)
        }
        FuzzyDistance::PartialRatio => partial_similarity(a, b),
    };
    Ok((1.0 - similarity).clamp(0.0, 1.0) as f32)
}

#[cfg(not(feature = "fuzzy"))]
fn normalized_distance(_kind: FuzzyDistance, _a: &str, _b: &str) -> Result<f32> {
    Err(DedupError::NotImplemented {
        method: Method::Fuzzy,
    })
}

/// Best similarity of the shorter string against every same-length window
/// of the longer one.
#[cfg(feature = "fuzzy")]
fn partial_similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let (short, short_len, long) = if a_len <= b_len { (a, a_len, b) } else { (b, b_len, a) };

    if short_len == 0 {
        return if long.is_empty() { 1.0 } else { 0.0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() == short_len {
        return strsim::normalized_levenshtein(short, long);
    }

    let mut best = 0.0f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(short, &candidate);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}
