//! Death and elimination rules, evaluated on post-move positions.

use super::config::GridConfig;
use super::obstacle::Obstacle;
use super::state::Snake;

/// Why the player died
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Head or a body segment left the playable rectangle
    Wall,
    /// Head ran into its own body
    SelfCollision,
    /// Head or a body segment shares a cell with an obstacle
    Obstacle,
    /// Head ran into the opponent's body
    OpponentBody,
    /// Lost a head-to-head against a longer opponent
    HeadToHead,
}

/// Result of the player/opponent contact check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentOutcome {
    /// No contact, or a head-to-head tie
    None,
    /// The player dies
    PlayerDies(CollisionType),
    /// The opponent is removed; the player gains `length`
    OpponentEliminated { length: usize },
}

/// Body indices closer to the head than this are skipped by the self check.
/// They sat next to the head on the previous tick.
pub const SELF_COLLISION_SKIP: usize = 2;

pub fn hits_boundary(snake: &Snake, grid: &GridConfig) -> bool {
    snake.points().any(|p| !grid.contains(p))
}

pub fn hits_self(snake: &Snake) -> bool {
    let head = snake.head();
    snake.body().iter().skip(SELF_COLLISION_SKIP).any(|&segment| segment == head)
}

pub fn hits_obstacle(snake: &Snake, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| snake.contains(o.pos))
}

/// Boundary, self and obstacle checks, in that order
pub fn check_player(
    snake: &Snake,
    grid: &GridConfig,
    obstacles: &[Obstacle],
) -> Option<CollisionType> {
    if hits_boundary(snake, grid) {
        return Some(CollisionType::Wall);
    }
    if hits_self(snake) {
        return Some(CollisionType::SelfCollision);
    }
    if hits_obstacle(snake, obstacles) {
        return Some(CollisionType::Obstacle);
    }
    None
}

/// Resolve contact between the player and the opponent.
///
/// Player head into opponent body kills the player. Opponent head into player
/// body eliminates the opponent. Heads meeting: the strictly longer snake
/// wins, equal lengths leave both alive.
pub fn resolve_opponent(player: &Snake, opponent: &Snake) -> OpponentOutcome {
    if opponent.body().contains(&player.head()) {
        return OpponentOutcome::PlayerDies(CollisionType::OpponentBody);
    }

    if player.body().contains(&opponent.head()) {
        return OpponentOutcome::OpponentEliminated {
            length: opponent.len(),
        };
    }

    if player.head() == opponent.head() {
        let player_len = player.len();
        let opponent_len = opponent.len();
        if player_len > opponent_len {
            return OpponentOutcome::OpponentEliminated {
                length: opponent_len,
            };
        }
        if opponent_len > player_len {
            return OpponentOutcome::PlayerDies(CollisionType::HeadToHead);
        }
    }

    OpponentOutcome::None
}
