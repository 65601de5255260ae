use std::fs;
use std::path::Path;

use super::naming::{metadata_file_name, META_EXTENSION, META_MARKER};
use super::types::MapStoreError;

/// File names of every `<name> meta.json` file directly inside `maps_dir`, sorted.
///
/// Only names that normalize to themselves are listed, so each one resolves as given.
pub(crate) fn list_metadata_files(maps_dir: &Path) -> Result<Vec<String>, MapStoreError> {
    let entries = fs::read_dir(maps_dir).map_err(|source| MapStoreError::ReadDir {
        path: maps_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::<String>::new();
    for entry in entries {
        let entry = entry.map_err(|source| MapStoreError::ReadDirEntry {
            path: maps_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            if is_metadata_file_name(name) {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn is_metadata_file_name(name: &str) -> bool {
    let is_meta = name
        .strip_suffix(META_EXTENSION)
        .is_some_and(|stem| stem.ends_with(META_MARKER));
    is_meta && metadata_file_name(name).is_ok_and(|normalized| normalized == name)
}
