use std::collections::BTreeMap;

use tracing::debug;

use crate::app::{
    Entity, EntityContainer, EntityId, EntityIdAllocator, SpriteVariant, Vec2, Viewport,
};
use crate::content::TileEntry;

pub const DEFAULT_TILE_SIZE_PX: f32 = 32.0;
pub const DEFAULT_PLAYER_IMAGE: &str = "sprites/overworld/player movement.png";
pub const DEFAULT_ANIMATION_FRAMES: u32 = 4;
pub const DEFAULT_TICKS_PER_ANIMATION_FRAME: u32 = 8;

/// Sizes and sprite settings used when turning metadata into entities.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub viewport: Viewport,
    pub tile_size: Vec2,
    pub player_image: String,
    pub animation_frames: u32,
    pub ticks_per_animation_frame: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            tile_size: Vec2::new(DEFAULT_TILE_SIZE_PX, DEFAULT_TILE_SIZE_PX),
            player_image: DEFAULT_PLAYER_IMAGE.to_string(),
            animation_frames: DEFAULT_ANIMATION_FRAMES,
            ticks_per_animation_frame: DEFAULT_TICKS_PER_ANIMATION_FRAME,
        }
    }
}

impl LayoutConfig {
    pub fn animated_variant(&self) -> SpriteVariant {
        SpriteVariant::animated(self.animation_frames, self.ticks_per_animation_frame)
    }
}

/// Appends one entity per entry at `origin + entry.coords`, in key order.
/// Returns the number of entities added.
pub fn instantiate_tiles(
    origin: Vec2,
    entries: &BTreeMap<String, TileEntry>,
    variant: SpriteVariant,
    footprint: Vec2,
    container: &mut EntityContainer,
    ids: &mut EntityIdAllocator,
) -> usize {
    for entry in entries.values() {
        container.add(Entity::new(
            ids.allocate(),
            entry.image.clone(),
            origin + entry.coords.to_vec2(),
            footprint,
            variant,
        ));
    }
    entries.len()
}

/// Puts the single player entity at the viewport center.
///
/// The player lives in camera space: its starting position ignores the map origin.
pub fn instantiate_player(
    container: &mut EntityContainer,
    layout: &LayoutConfig,
    ids: &mut EntityIdAllocator,
) -> EntityId {
    let stale = container.clear();
    if stale > 0 {
        debug!(stale, "player_container_reset");
    }
    let id = ids.allocate();
    container.add(Entity::new(
        id,
        layout.player_image.clone(),
        layout.viewport.center(),
        layout.tile_size,
        layout.animated_variant(),
    ));
    id
}
