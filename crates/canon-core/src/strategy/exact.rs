use super::{Interrupt, SimilarityStrategy};
use crate::config::Method;
use crate::error::Result;
use crate::key::canonical_key;
use crate::types::Entity;

/// Case-insensitive name + label equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl ExactMatch {
    pub fn new() -> Self {
        ExactMatch
    }
}

impl SimilarityStrategy for ExactMatch {
    type Signature = String;

    fn method(&self) -> Method {
        Method::ExactMatch
    }

    fn max_distance(&self) -> f32 {
        0.0
    }

    fn pairwise(&self) -> bool {
        false
    }

    fn signature(&self, entity: &Entity, _interrupt: &Interrupt) -> Result<String> {
        Ok(canonical_key(entity))
    }

    fn distance(&self, a: &String, b: &String, _interrupt: &Interrupt) -> Result<f32> {
        Ok(if a == b { 0.0 } else { 1.0 })
    }

    fn decide(&self, a: &Entity, b: &Entity) -> Result<bool> {
        Ok(canonical_key(a) == canonical_key(b))
    }
}
