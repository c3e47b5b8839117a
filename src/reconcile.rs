use std::collections::HashSet;

use crate::types::Track;

/// Tracks whose identity key is not in `existing`, in source order.
/// Duplicates within `source` are kept as-is.
pub fn diff(source: &[Track], existing: &HashSet<String>) -> Vec<Track> {
    source.iter()
        .filter(|t| !existing.contains(&t.identity_key()))
        .cloned()
        .collect()
}
