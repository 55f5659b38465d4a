//! Component deduplication across discovery sources
//!
//! The workload pass and the Helm release pass can both report the same
//! logical component. One fact survives per `namespace/name` key, with
//! release-manager metadata taking priority over workload-shape inspection.

use crate::facts::{ComponentFact, ComponentSource};
use std::collections::HashMap;

/// Priority rank of a discovery source; higher wins a dedup collision
///
/// Helm release metadata knows the chart version and release status, so it
/// outranks every workload-shape source. The workload sources rank equally,
/// which leaves first-seen-wins between them.
fn source_priority(source: ComponentSource) -> u8 {
    match source {
        ComponentSource::Deployment
        | ComponentSource::StatefulSet
        | ComponentSource::DaemonSet => 0,
        ComponentSource::HelmRelease => 1,
    }
}

/// Merge component facts from all discovery passes into one fact per key
///
/// Single pass over the unordered input: first sight inserts; a collision
/// replaces the held entry only when the incoming source strictly outranks
/// it. Output ordering is not significant.
pub fn resolve_components(components: Vec<ComponentFact>) -> Vec<ComponentFact> {
    let mut resolved: HashMap<String, ComponentFact> = HashMap::new();

    for incoming in components {
        match resolved.entry(incoming.key()) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                if source_priority(incoming.source) > source_priority(slot.get().source) {
                    tracing::debug!(
                        "Component {} re-resolved from {} to {}",
                        slot.key(),
                        slot.get().source,
                        incoming.source
                    );
                    slot.insert(incoming);
                }
            }
        }
    }

    resolved.into_values().collect()
}
