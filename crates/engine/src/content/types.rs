use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::Vec2;
use crate::asset_refs::ImageRefError;

/// Key of the gate whose coordinates anchor the backdrop.
pub const FIRST_GATE_KEY: &str = "gate 1";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coords {
    pub x: f32,
    pub y: f32,
}

impl Coords {
    pub fn to_vec2(self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Gate {
    pub id: i64,
    pub coords: Coords,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TileEntry {
    pub coords: Coords,
    pub image: String,
}

/// Parsed `<name> meta.json` record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapMetadata {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub gates: BTreeMap<String, Gate>,
    #[serde(rename = "NPC's", alias = "npcs", default)]
    pub npcs: BTreeMap<String, TileEntry>,
    #[serde(rename = "Obstacles", alias = "obstacles", default)]
    pub obstacles: BTreeMap<String, TileEntry>,
}

impl MapMetadata {
    /// The `"gate 1"` entry, or the lowest-keyed gate when that key is absent.
    pub fn first_gate(&self) -> Option<&Gate> {
        self.gates
            .get(FIRST_GATE_KEY)
            .or_else(|| self.gates.values().next())
    }

    pub fn gate_with_id(&self, gate_id: i64) -> Option<&Gate> {
        self.gates.values().find(|gate| gate.id == gate_id)
    }

    pub(crate) fn image_refs(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.image.as_str()).chain(
            self.npcs
                .values()
                .chain(self.obstacles.values())
                .map(|entry| entry.image.as_str()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapIdError {
    #[error("map identifier must not be empty")]
    Empty,
    #[error("map identifier must not contain path separators")]
    PathSeparator,
    #[error("map identifier must not contain '..'")]
    ParentTraversal,
}

#[derive(Debug, Error)]
pub enum MapStoreError {
    #[error("invalid map identifier '{map_id}': {source}")]
    InvalidIdentifier {
        map_id: String,
        #[source]
        source: MapIdError,
    },
    #[error("map metadata not found for '{map_id}' (expected {path})")]
    NotFound { map_id: String, path: PathBuf },
    #[error("failed to read map metadata {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read maps directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse map metadata {path} at {field_path}: {message}")]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("invalid image reference '{image}' in {path}: {source}")]
    InvalidImageRef {
        path: PathBuf,
        image: String,
        #[source]
        source: ImageRefError,
    },
}

impl MapStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapStoreError::NotFound { .. })
    }
}
