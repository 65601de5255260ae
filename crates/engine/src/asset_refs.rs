use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    #[error("image reference must not be empty")]
    Empty,
    #[error("image reference must be relative (no leading '/')")]
    LeadingSlash,
    #[error("image reference must use '/' separators, found '\\\\'")]
    Backslash,
    #[error("image reference must not contain '..'")]
    ParentTraversal,
    #[error("image reference contains control character {character:?}")]
    ControlCharacter { character: char },
}

/// Image references are paths relative to the assets directory, e.g.
/// `sprites/overworld/player movement.png`.
pub(crate) fn validate_image_ref(image: &str) -> Result<(), ImageRefError> {
    if image.trim().is_empty() {
        return Err(ImageRefError::Empty);
    }
    if image.starts_with('/') {
        return Err(ImageRefError::LeadingSlash);
    }
    if image.contains('\\') {
        return Err(ImageRefError::Backslash);
    }
    if image.split('/').any(|segment| segment == "..") {
        return Err(ImageRefError::ParentTraversal);
    }
    if let Some(character) = image.chars().find(|ch| ch.is_control()) {
        return Err(ImageRefError::ControlCharacter { character });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_image_ref;

    #[test]
    fn accepts_valid_refs() {
        for image in [
            "sprites/town.png",
            "sprites/overworld/player movement.png",
            "a-b/c_d.png",
            "backdrop..v2.png",
        ] {
            assert!(validate_image_ref(image).is_ok(), "image={image}");
        }
    }

    #[test]
    fn rejects_invalid_refs() {
        for image in ["", "  ", "/abs.png", "..", "a/../b.png", r"a\b.png", "a\nb.png"] {
            assert!(validate_image_ref(image).is_err(), "image={image:?}");
        }
    }
}
