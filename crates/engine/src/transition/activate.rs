use thiserror::Error;
use tracing::info;

use crate::app::{
    ActiveMapState, ContainerKind, Entity, EntityIdAllocator, SpriteVariant, Vec2,
};
use crate::content::{MapSource, MapStoreError};

use super::instantiate::{instantiate_player, instantiate_tiles, LayoutConfig};

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Store(#[from] MapStoreError),
    #[error("map '{map_id}' declares no gates, so it has no backdrop origin")]
    NoGates { map_id: String },
}

impl ActivationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ActivationError::Store(error) if error.is_not_found())
    }
}

/// Builds the complete entity set for `map_id`.
///
/// The state is assembled locally and only returned once every container is populated,
/// so a failure leaves the caller holding whatever it had before.
pub fn activate<S: MapSource + ?Sized>(
    store: &S,
    map_id: &str,
    layout: &LayoutConfig,
) -> Result<ActiveMapState, ActivationError> {
    let metadata = store.resolve(map_id)?;
    let first_gate = metadata
        .first_gate()
        .cloned()
        .ok_or_else(|| ActivationError::NoGates {
            map_id: map_id.to_string(),
        })?;
    let origin = first_gate.coords.to_vec2();

    let mut ids = EntityIdAllocator::default();
    let mut state = ActiveMapState::empty(metadata.name.clone(), first_gate.clone());

    state.container_mut(ContainerKind::Background).add(Entity::new(
        ids.allocate(),
        metadata.image.clone(),
        origin,
        Vec2::ZERO,
        SpriteVariant::Static,
    ));
    state.container_mut(ContainerKind::Gate).add(Entity::new(
        ids.allocate(),
        String::new(),
        first_gate.coords.to_vec2(),
        layout.tile_size,
        SpriteVariant::Static,
    ));

    let npcs = instantiate_tiles(
        origin,
        &metadata.npcs,
        layout.animated_variant(),
        layout.tile_size,
        state.container_mut(ContainerKind::Npc),
        &mut ids,
    );
    let obstacles = instantiate_tiles(
        origin,
        &metadata.obstacles,
        SpriteVariant::Static,
        layout.tile_size,
        state.container_mut(ContainerKind::Obstacle),
        &mut ids,
    );
    instantiate_player(state.container_mut(ContainerKind::Player), layout, &mut ids);

    info!(
        map = %metadata.name,
        gate_id = first_gate.id,
        origin_x = origin.x,
        origin_y = origin.y,
        npcs,
        obstacles,
        "map_activated"
    );
    Ok(state)
}
