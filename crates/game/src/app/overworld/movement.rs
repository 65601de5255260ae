use std::time::Duration;

use link_engine::app::{InputAction, InputSnapshot, Vec2};

/// Player displacement for one tick. Diagonals are normalized so they are not faster.
pub(crate) fn movement_delta(
    input: &InputSnapshot,
    speed_px_per_second: f32,
    dt: Duration,
) -> Vec2 {
    if !input.any_movement() {
        return Vec2::ZERO;
    }
    let mut x = 0.0f32;
    let mut y = 0.0f32;
    if input.is_down(InputAction::MoveLeft) {
        x -= 1.0;
    }
    if input.is_down(InputAction::MoveRight) {
        x += 1.0;
    }
    if input.is_down(InputAction::MoveUp) {
        y -= 1.0;
    }
    if input.is_down(InputAction::MoveDown) {
        y += 1.0;
    }

    let length = (x * x + y * y).sqrt();
    if length == 0.0 {
        return Vec2::ZERO;
    }
    let step = speed_px_per_second * dt.as_secs_f32() / length;
    Vec2::new(x * step, y * step)
}
