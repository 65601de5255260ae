use super::types::MapIdError;

pub const META_MARKER: &str = " meta";
pub const META_EXTENSION: &str = ".json";

/// Turns `town`, `town meta` or `town meta.json` into `town meta.json`.
///
/// The marker is appended first, then the extension, each only when the identifier
/// does not already contain it.
pub fn metadata_file_name(map_id: &str) -> Result<String, MapIdError> {
    if map_id.trim().is_empty() {
        return Err(MapIdError::Empty);
    }
    if map_id.contains('/') || map_id.contains('\\') {
        return Err(MapIdError::PathSeparator);
    }
    if map_id.contains("..") {
        return Err(MapIdError::ParentTraversal);
    }

    let mut file_name = map_id.to_string();
    if !file_name.contains(META_MARKER) {
        file_name.push_str(META_MARKER);
    }
    if !file_name.contains(META_EXTENSION) {
        file_name.push_str(META_EXTENSION);
    }
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_spellings_normalize_to_the_same_file() {
        for map_id in ["town", "town meta", "town meta.json"] {
            assert_eq!(
                metadata_file_name(map_id).expect("valid"),
                "town meta.json",
                "map_id={map_id}"
            );
        }
    }

    #[test]
    fn extension_without_marker_gets_marker_appended_after_it() {
        assert_eq!(
            metadata_file_name("town.json").expect("valid"),
            "town.json meta"
        );
    }

    #[test]
    fn names_with_spaces_are_kept() {
        assert_eq!(
            metadata_file_name("route 201").expect("valid"),
            "route 201 meta.json"
        );
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert_eq!(metadata_file_name(""), Err(MapIdError::Empty));
        assert_eq!(metadata_file_name("  "), Err(MapIdError::Empty));
        assert_eq!(
            metadata_file_name("maps/town"),
            Err(MapIdError::PathSeparator)
        );
        assert_eq!(
            metadata_file_name(r"maps\town"),
            Err(MapIdError::PathSeparator)
        );
        assert_eq!(
            metadata_file_name("..town"),
            Err(MapIdError::ParentTraversal)
        );
    }
}
