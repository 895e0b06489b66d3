//! Greedy steering for the opponent snake.
//!
//! The policy is memoryless: it looks only at the opponent's head and the
//! primary item. It does not avoid obstacles, walls or either body.

use super::action::Direction;
use super::state::Position;

/// Direction that closes the larger axis gap between `head` and `target`.
///
/// On equal gaps the vertical axis wins when it is non-zero; with the head on
/// the target, `current` is kept.
pub fn choose_direction(head: Position, target: Position, current: Direction) -> Direction {
    let dx = target.x - head.x;
    let dy = target.y - head.y;

    if dx.abs() > dy.abs() {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy != 0 {
        if dy > 0 { Direction::Down } else { Direction::Up }
    } else {
        current
    }
}

/// Direction for this tick, or `None` when there is no item to chase
pub fn steer(head: Position, target: Option<Position>, current: Direction) -> Option<Direction> {
    target.map(|target| choose_direction(head, target, current))
}
