//! Similarity strategies: pluggable "same entity?" decisions.
//!
//! A strategy turns an entity into a signature once (the expensive part:
//! normalisation, an embedding call) and then compares signatures by
//! distance against its threshold. The resolver caches signatures for
//! representatives so each entity is prepared exactly once per call.

mod embeddings;
mod exact;
mod fuzzy;

pub use embeddings::EmbeddingsMatch;
pub use exact::ExactMatch;
pub use fuzzy::{string_distance, FuzzyMatch};

use crate::config::Method;
use crate::error::{DedupError, Result};
use crate::key::label_key;
use crate::types::Entity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pairwise entity comparator.
pub trait SimilarityStrategy: Send + Sync {
    /// Per-entity prepared form that distances are computed on.
    type Signature: Send + Sync;

    fn method(&self) -> Method;

    /// Pairs at or below this distance are the same entity.
    fn max_distance(&self) -> f32;

    /// Whether candidates must be compared against representatives.
    /// When false, canonical-key equality is the whole decision.
    fn pairwise(&self) -> bool {
        true
    }

    /// Restrict comparisons to entities with the same label.
    fn require_same_label(&self) -> bool {
        true
    }

    fn signature(&self, entity: &Entity, interrupt: &Interrupt) -> Result<Self::Signature>;

    fn distance(
        &self,
        a: &Self::Signature,
        b: &Self::Signature,
        interrupt: &Interrupt,
    ) -> Result<f32>;

    /// Signatures for a batch of entities, in order.
    fn signatures(&self, entities: &[&Entity], interrupt: &Interrupt) -> Result<Vec<Self::Signature>> {
        entities
            .iter()
            .map(|entity| self.signature(entity, interrupt))
            .collect()
    }

    /// Do `a` and `b` refer to the same entity?
    ///
    /// Entities with different labels never match while
    /// [`require_same_label`](Self::require_same_label) holds.
    fn decide(&self, a: &Entity, b: &Entity) -> Result<bool> {
        if self.require_same_label() && label_key(a) != label_key(b) {
            return Ok(false);
        }
        let interrupt = Interrupt::none();
        let sig_a = self.signature(a, &interrupt)?;
        let sig_b = self.signature(b, &interrupt)?;
        Ok(self.distance(&sig_a, &sig_b, &interrupt)? <= self.max_distance())
    }

    /// Position of the first representative that matches `candidate`.
    ///
    /// Implementations that evaluate out of order must still return the
    /// lowest matching position.
    fn first_match(
        &self,
        candidate: &Self::Signature,
        representatives: &[&Self::Signature],
        interrupt: &Interrupt,
    ) -> Result<Option<usize>> {
        for (pos, rep) in representatives.iter().enumerate() {
            if self.distance(rep, candidate, interrupt)? <= self.max_distance() {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }
}

/// Shared flag for cancelling in-flight deduplication from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancellation and deadline state for one deduplication call.
///
/// Checked by strategies before provider calls and distance computations,
/// never by the resolver loop itself.
#[derive(Debug, Clone)]
pub struct Interrupt {
    cancel: Option<CancelHandle>,
    started: Instant,
    timeout: Option<Duration>,
}

impl Interrupt {
    /// An interrupt that never fires.
    pub fn none() -> Self {
        Self::new(None, None)
    }

    /// Starts the clock now.
    pub fn new(cancel: Option<CancelHandle>, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            timeout,
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled) {
            return Err(DedupError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = self.started.elapsed();
            if elapsed > timeout {
                return Err(DedupError::Timeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}
