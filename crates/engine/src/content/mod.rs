mod cache;
mod discovery;
mod naming;
mod store;
mod types;

pub use cache::CachedMapStore;
pub use naming::{metadata_file_name, META_EXTENSION, META_MARKER};
pub use store::{DirMapStore, MapSource};
pub use types::{
    Coords, Gate, MapIdError, MapMetadata, MapStoreError, TileEntry, FIRST_GATE_KEY,
};
