use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::store::{parse_metadata, DirMapStore, MapSource};
use super::types::{MapMetadata, MapStoreError};

#[derive(Debug, Clone)]
struct CachedMetadata {
    content_hash_hex: String,
    metadata: MapMetadata,
}

/// Directory store that skips re-parsing files whose bytes have not changed.
///
/// Every `resolve` still reads the file and hashes it, so edits on disk are picked up
/// on the next call and a deleted file is reported as not found.
#[derive(Debug)]
pub struct CachedMapStore {
    inner: DirMapStore,
    entries: RefCell<HashMap<PathBuf, CachedMetadata>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl CachedMapStore {
    pub fn new(inner: DirMapStore) -> Self {
        Self {
            inner,
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &DirMapStore {
        &self.inner
    }

    pub fn cache_hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn cache_misses(&self) -> u64 {
        self.misses.get()
    }
}

impl MapSource for CachedMapStore {
    fn resolve(&self, map_id: &str) -> Result<MapMetadata, MapStoreError> {
        let (path, bytes) = match self.inner.read_bytes(map_id) {
            Ok(read) => read,
            Err(error) => {
                if let MapStoreError::NotFound { path, .. } = &error {
                    self.entries.borrow_mut().remove(path);
                }
                return Err(error);
            }
        };
        let content_hash_hex = hash_bytes_hex(&bytes);

        if let Some(cached) = self.entries.borrow().get(&path) {
            if cached.content_hash_hex == content_hash_hex {
                self.hits.set(self.hits.get().saturating_add(1));
                return Ok(cached.metadata.clone());
            }
        }

        let metadata = parse_metadata(&path, &bytes)?;
        self.misses.set(self.misses.get().saturating_add(1));
        debug!(
            map_id,
            path = %path.display(),
            content_hash = %content_hash_hex,
            "map_metadata_cache_refresh"
        );
        self.entries.borrow_mut().insert(
            path,
            CachedMetadata {
                content_hash_hex,
                metadata: metadata.clone(),
            },
        );
        Ok(metadata)
    }

    fn list_available(&self) -> Result<Vec<String>, MapStoreError> {
        self.inner.list_available()
    }
}

fn hash_bytes_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
