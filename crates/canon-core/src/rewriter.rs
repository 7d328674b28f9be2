use crate::resolver::CanonicalMap;
use crate::types::{Entity, Fact, FactList};
use std::sync::Arc;

/// Facts with endpoints pointing at canonical representatives.
#[derive(Debug, Clone, Default)]
pub struct Rewritten {
    pub facts: FactList,

    /// Endpoints that now point at a different entity instance.
    pub endpoints_rewired: usize,
}

/// Point every fact endpoint at its canonical representative.
///
/// Endpoints whose key is absent from the map are left as they are.
/// Fact order and count are preserved; inputs are never mutated.
pub fn rewrite(facts: &FactList, canonical_map: &CanonicalMap) -> Rewritten {
    let mut endpoints_rewired = 0;

    let rewritten = facts
        .iter()
        .map(|fact| {
            let subject = canonical_endpoint(&fact.subject, canonical_map, &mut endpoints_rewired);
            let object = canonical_endpoint(&fact.object, canonical_map, &mut endpoints_rewired);
            fact.with_endpoints(subject, object)
        })
        .collect::<Vec<Fact>>();

    Rewritten {
        facts: FactList::from(rewritten),
        endpoints_rewired,
    }
}

fn canonical_endpoint(
    endpoint: &Arc<Entity>,
    canonical_map: &CanonicalMap,
    rewired: &mut usize,
) -> Arc<Entity> {
    match canonical_map.representative_of(endpoint) {
        Some(rep) => {
            if !Arc::ptr_eq(rep, endpoint) {
                *rewired += 1;
            }
            Arc::clone(rep)
        }
        None => Arc::clone(endpoint),
    }
}
