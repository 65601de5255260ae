/// Player intents the overworld reacts to. Keys are mapped onto these by the loop runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

impl InputAction {
    /// Indexed by `index()`.
    pub const ALL: [InputAction; 5] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Quit,
    ];

    pub fn is_movement(self) -> bool {
        !matches!(self, InputAction::Quit)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

const ACTION_COUNT: usize = InputAction::ALL.len();

/// Held state per action, carried from tick to tick until the key is released.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn any_movement(&self) -> bool {
        InputAction::ALL
            .iter()
            .any(|action| action.is_movement() && self.is_down(*action))
    }
}
