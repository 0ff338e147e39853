use std::collections::BTreeSet;

use crate::contract::SubtaskMeta;

/// Picks the primary-plugin subtasks that serve the requested entities.
///
/// Only subtasks enabled by default are considered. Metadata order is kept. An empty
/// entity set selects nothing; the result is always a list, never absent.
pub fn select_subtasks(metas: &[SubtaskMeta], entities: &BTreeSet<String>) -> Vec<String> {
    if entities.is_empty() {
        return Vec::new();
    }
    metas
        .iter()
        .filter(|meta| meta.enabled_by_default)
        .filter(|meta| meta.entity_types.iter().any(|t| entities.contains(t)))
        .map(|meta| meta.name.clone())
        .collect()
}
