mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod world;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{world_to_screen, Camera2D, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX};
pub use scene::{InputSnapshot, Scene, SceneCommand, SceneLoadError};
pub use world::{
    ActiveMapState, AnimationState, ContainerKind, Entity, EntityContainer, EntityId,
    EntityIdAllocator, Rect, SpriteVariant, Vec2,
};
