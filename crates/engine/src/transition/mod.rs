mod activate;
mod detector;
mod instantiate;
mod links;
mod session;

pub use activate::{activate, ActivationError};
pub use detector::{
    gate_contact, ClearOrder, DetectorPhase, EdgeDistances, TransitionConfig, TransitionDetector,
    TransitionError, TransitionOutcome, DEFAULT_COOLDOWN, DEFAULT_TOLERANCE,
};
pub use instantiate::{
    instantiate_player, instantiate_tiles, LayoutConfig, DEFAULT_ANIMATION_FRAMES,
    DEFAULT_PLAYER_IMAGE, DEFAULT_TICKS_PER_ANIMATION_FRAME, DEFAULT_TILE_SIZE_PX,
};
pub use links::{link_candidates, resolve_link};
pub use session::MapSession;
