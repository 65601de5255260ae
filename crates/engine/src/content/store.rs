use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::asset_refs::validate_image_ref;

use super::discovery::list_metadata_files;
use super::naming::metadata_file_name;
use super::types::{MapMetadata, MapStoreError};

/// Where map metadata comes from.
pub trait MapSource {
    /// Accepts `town`, `town meta` and `town meta.json` alike.
    fn resolve(&self, map_id: &str) -> Result<MapMetadata, MapStoreError>;

    /// Every metadata identifier in the data set, recomputed on each call.
    fn list_available(&self) -> Result<Vec<String>, MapStoreError>;
}

impl<S: MapSource + ?Sized> MapSource for &S {
    fn resolve(&self, map_id: &str) -> Result<MapMetadata, MapStoreError> {
        (**self).resolve(map_id)
    }

    fn list_available(&self) -> Result<Vec<String>, MapStoreError> {
        (**self).list_available()
    }
}

/// Reads `<maps_dir>/<name> meta.json` files straight from disk.
#[derive(Debug, Clone)]
pub struct DirMapStore {
    maps_dir: PathBuf,
}

impl DirMapStore {
    pub fn new(maps_dir: impl Into<PathBuf>) -> Self {
        Self {
            maps_dir: maps_dir.into(),
        }
    }

    pub fn maps_dir(&self) -> &Path {
        &self.maps_dir
    }

    pub fn metadata_path(&self, map_id: &str) -> Result<PathBuf, MapStoreError> {
        let file_name =
            metadata_file_name(map_id).map_err(|source| MapStoreError::InvalidIdentifier {
                map_id: map_id.to_string(),
                source,
            })?;
        Ok(self.maps_dir.join(file_name))
    }

    pub(crate) fn read_bytes(&self, map_id: &str) -> Result<(PathBuf, Vec<u8>), MapStoreError> {
        let path = self.metadata_path(map_id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok((path, bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(MapStoreError::NotFound {
                map_id: map_id.to_string(),
                path,
            }),
            Err(source) => Err(MapStoreError::ReadFile { path, source }),
        }
    }
}

impl MapSource for DirMapStore {
    fn resolve(&self, map_id: &str) -> Result<MapMetadata, MapStoreError> {
        let (path, bytes) = self.read_bytes(map_id)?;
        parse_metadata(&path, &bytes)
    }

    fn list_available(&self) -> Result<Vec<String>, MapStoreError> {
        list_metadata_files(&self.maps_dir)
    }
}

pub(crate) fn parse_metadata(path: &Path, bytes: &[u8]) -> Result<MapMetadata, MapStoreError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let metadata = serde_path_to_error::deserialize::<_, MapMetadata>(&mut deserializer)
        .map_err(|error| {
            let field_path = error.path().to_string();
            MapStoreError::Parse {
                path: path.to_path_buf(),
                field_path: if field_path.is_empty() {
                    ".".to_string()
                } else {
                    field_path
                },
                message: error.into_inner().to_string(),
            }
        })?;

    for image in metadata.image_refs() {
        validate_image_ref(image).map_err(|source| MapStoreError::InvalidImageRef {
            path: path.to_path_buf(),
            image: image.to_string(),
            source,
        })?;
    }
    Ok(metadata)
}
