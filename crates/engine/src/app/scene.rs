use std::error::Error as StdError;
use std::time::Duration;

use super::input::ActionStates;
use super::{ActiveMapState, InputAction};

/// Error a scene reports when it cannot load its first state.
pub type SceneLoadError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True when any movement action is held.
    pub fn any_movement(&self) -> bool {
        self.actions.any_movement()
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// The game side of the frame loop.
pub trait Scene {
    fn load(&mut self) -> Result<(), SceneLoadError>;
    /// `elapsed` is the simulated time since the scene was loaded, including this tick.
    fn update(
        &mut self,
        fixed_dt: Duration,
        elapsed: Duration,
        input: &InputSnapshot,
    ) -> SceneCommand;
    fn active_map(&self) -> Option<&ActiveMapState>;
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_nothing_pressed() {
        let snapshot = InputSnapshot::empty();
        assert!(!snapshot.quit_requested());
        assert!(!snapshot.is_down(InputAction::MoveUp));
    }

    #[test]
    fn builder_sets_actions() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_quit_requested(true);
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert!(snapshot.quit_requested());
        assert!(snapshot.any_movement());
        assert!(!InputSnapshot::empty().with_quit_requested(true).any_movement());
    }
}
