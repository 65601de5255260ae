mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{world_to_screen, Camera2D, Viewport};

pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;
