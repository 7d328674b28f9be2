use crate::error::Result;
use crate::key::{canonical_key, label_key};
use crate::strategy::{Interrupt, SimilarityStrategy};
use crate::types::{Entity, EntityList};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Canonical key → representative, for one deduplication call.
///
/// Every key seen during resolution is present, including keys of
/// entities that were merged into an earlier representative.
#[derive(Debug, Clone, Default)]
pub struct CanonicalMap {
    index: HashMap<String, usize>,
    representatives: Vec<Arc<Entity>>,
}

impl CanonicalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Representative for a canonical key.
    pub fn get(&self, key: &str) -> Option<&Arc<Entity>> {
        self.index.get(key).map(|&idx| &self.representatives[idx])
    }

    /// Representative for an entity, looked up by its canonical key.
    pub fn representative_of(&self, entity: &Entity) -> Option<&Arc<Entity>> {
        self.get(&canonical_key(entity))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys (aliases included).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Representatives in first-seen order.
    pub fn representatives(&self) -> &[Arc<Entity>] {
        &self.representatives
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn alias(&mut self, key: String, idx: usize) {
        self.index.entry(key).or_insert(idx);
    }

    fn add_representative(&mut self, key: String, entity: Arc<Entity>) -> usize {
        let idx = self.representatives.len();
        self.representatives.push(entity);
        self.index.insert(key, idx);
        idx
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Key → representative map, representatives in first-seen order.
    pub canonical_map: CanonicalMap,

    /// For each input entity, the index of its representative.
    pub assignments: Vec<usize>,

    /// Representative signatures compared against candidates.
    pub comparisons: u64,
}

impl Resolution {
    pub fn representatives(&self) -> &[Arc<Entity>] {
        self.canonical_map.representatives()
    }

    /// Number of input entities folded into an earlier representative.
    pub fn merged(&self) -> usize {
        self.assignments.len() - self.representatives().len()
    }

    /// Representative assigned to the `i`-th input entity.
    pub fn representative_at(&self, i: usize) -> Option<&Arc<Entity>> {
        self.assignments
            .get(i)
            .map(|&idx| &self.canonical_map.representatives[idx])
    }

    pub fn to_entity_list(&self) -> EntityList {
        EntityList::from(self.representatives().to_vec())
    }
}

/// Partition `entities` into canonical groups, first occurrence wins.
///
/// Exact canonical-key equality is a match under every strategy. Strategies
/// that compare pairwise are then consulted against the representatives
/// seen so far (within the entity's label block when the strategy asks for
/// it), and the earliest matching representative is chosen. Unmatched
/// entities become new representatives in input order.
///
/// Cost is O(n) for exact matching and O(n²) within a label block for
/// pairwise strategies.
pub fn resolve<'a, S, I>(entities: I, strategy: &S, interrupt: &Interrupt) -> Result<Resolution>
where
    S: SimilarityStrategy,
    I: IntoIterator<Item = &'a Arc<Entity>>,
{
    let pairwise = strategy.pairwise();
    let entities: Vec<&Arc<Entity>> = entities.into_iter().collect();
    let keys: Vec<String> = entities.iter().map(|e| canonical_key(e)).collect();

    let mut prepared = if pairwise {
        prepare_signatures(&entities, &keys, strategy, interrupt)?
    } else {
        HashMap::new()
    };

    let mut map = CanonicalMap::new();
    let mut assignments = Vec::with_capacity(entities.len());
    let mut signatures: Vec<S::Signature> = Vec::new();
    let mut blocks: HashMap<String, Vec<usize>> = HashMap::new();
    let mut comparisons = 0u64;

    for (entity, key) in entities.into_iter().zip(keys) {
        if let Some(idx) = map.index_of(&key) {
            assignments.push(idx);
            continue;
        }

        if !pairwise {
            let idx = map.add_representative(key, Arc::clone(entity));
            assignments.push(idx);
            continue;
        }

        let signature = match prepared.remove(&key) {
            Some(signature) => signature,
            None => strategy.signature(entity, interrupt)?,
        };
        let block = if strategy.require_same_label() {
            label_key(entity)
        } else {
            String::new()
        };

        let found = match blocks.get(&block) {
            Some(members) => {
                let candidates: Vec<&S::Signature> =
                    members.iter().map(|&idx| &signatures[idx]).collect();
                comparisons += candidates.len() as u64;
                strategy
                    .first_match(&signature, &candidates, interrupt)?
                    .map(|pos| members[pos])
            }
            None => None,
        };

        match found {
            Some(idx) => {
                log::debug!(
                    "{}: '{}' ({}) resolved to '{}' ({})",
                    strategy.method(),
                    entity.name,
                    entity.label,
                    map.representatives[idx].name,
                    map.representatives[idx].label
                );
                map.alias(key, idx);
                assignments.push(idx);
            }
            None => {
                let idx = map.add_representative(key, Arc::clone(entity));
                signatures.push(signature);
                blocks.entry(block).or_default().push(idx);
                assignments.push(idx);
            }
        }
    }

    Ok(Resolution {
        canonical_map: map,
        assignments,
        comparisons,
    })
}

/// Signatures for the first entity of every distinct key, computed in one
/// batch so providers can amortise the call.
fn prepare_signatures<S: SimilarityStrategy>(
    entities: &[&Arc<Entity>],
    keys: &[String],
    strategy: &S,
    interrupt: &Interrupt,
) -> Result<HashMap<String, S::Signature>> {
    let mut seen = HashSet::new();
    let mut firsts: Vec<&Entity> = Vec::new();
    let mut first_keys: Vec<&str> = Vec::new();

    for (entity, key) in entities.iter().zip(keys) {
        if seen.insert(key.as_str()) {
            firsts.push(entity);
            first_keys.push(key);
        }
    }

    let signatures = strategy.signatures(&firsts, interrupt)?;
    Ok(first_keys
        .into_iter()
        .map(str::to_string)
        .zip(signatures)
        .collect())
}
