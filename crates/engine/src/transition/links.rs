use tracing::warn;

use crate::content::{metadata_file_name, MapSource, MapStoreError};

/// Names of every map other than `current_map` that owns a gate with `gate_id`,
/// in enumeration order.
pub fn link_candidates<S: MapSource + ?Sized>(
    store: &S,
    gate_id: i64,
    current_map: &str,
) -> Result<Vec<String>, MapStoreError> {
    let current_file = metadata_file_name(current_map).ok();
    let mut candidates = Vec::new();
    for file_name in store.list_available()? {
        if current_file.as_deref() == Some(file_name.as_str()) {
            continue;
        }
        let metadata = store.resolve(&file_name)?;
        if metadata.name == current_map {
            continue;
        }
        if metadata.gate_with_id(gate_id).is_some() {
            candidates.push(metadata.name);
        }
    }
    Ok(candidates)
}

/// The map on the other side of gate `gate_id`, or `None` when no other map declares it.
///
/// When several maps declare the id the first in enumeration order wins and a
/// `gate_link_ambiguous` warning lists all of them.
pub fn resolve_link<S: MapSource + ?Sized>(
    store: &S,
    gate_id: i64,
    current_map: &str,
) -> Result<Option<String>, MapStoreError> {
    let mut candidates = link_candidates(store, gate_id, current_map)?;
    if candidates.len() > 1 {
        warn!(
            gate_id,
            current_map,
            candidates = ?candidates,
            chosen = %candidates[0],
            "gate_link_ambiguous"
        );
    }
    if candidates.is_empty() {
        return Ok(None);
    }
    Ok(Some(candidates.swap_remove(0)))
}
