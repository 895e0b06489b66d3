//! Static and bouncing hazards for the obstacle mode.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::{GridConfig, ObstacleConfig};
use super::items;
use super::state::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Static,
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Position,
    pub kind: ObstacleKind,
    /// Per-tick displacement; zero for static obstacles
    pub velocity: (i32, i32),
}

impl Obstacle {
    pub fn fixed(pos: Position) -> Self {
        Self {
            pos,
            kind: ObstacleKind::Static,
            velocity: (0, 0),
        }
    }

    pub fn moving(pos: Position, velocity: (i32, i32)) -> Self {
        Self {
            pos,
            kind: ObstacleKind::Moving,
            velocity,
        }
    }

    /// One tick of motion. A velocity component that would leave the
    /// rectangle is reversed first, per axis, so the obstacle bounces.
    fn advanced(mut self, grid: &GridConfig) -> Self {
        if self.kind == ObstacleKind::Static {
            return self;
        }
        let (mut dx, mut dy) = self.velocity;
        let next_x = self.pos.x + dx;
        if next_x < grid.min_x() || next_x > grid.max_x() {
            dx = -dx;
        }
        let next_y = self.pos.y + dy;
        if next_y < grid.min_y() || next_y > grid.max_y() {
            dy = -dy;
        }
        self.velocity = (dx, dy);
        self.pos = self.pos.moved_by(dx, dy);
        self
    }
}

/// Spawns an obstacle every `spawn_interval_ticks` and moves the moving ones
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    ticks_since_spawn: u32,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn is_obstacle_at(&self, pos: Position) -> bool {
        self.obstacles.iter().any(|o| o.pos == pos)
    }

    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Advance the spawn counter and, when due, try to place one obstacle.
    ///
    /// `occupied` reports cells held by items or actors; existing obstacles
    /// are rejected here. Returns the obstacle placed this tick, if any.
    pub fn spawn_tick<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        grid: &GridConfig,
        config: &ObstacleConfig,
        occupied: impl Fn(Position) -> bool,
    ) -> Option<Obstacle> {
        self.ticks_since_spawn += 1;
        if self.ticks_since_spawn < config.spawn_interval_ticks {
            return None;
        }
        self.ticks_since_spawn = 0;

        let pos = items::sample(rng, grid, config.spawn_attempts, |pos| {
            occupied(pos) || self.is_obstacle_at(pos)
        })?;

        let obstacle = if rng.gen_bool(config.moving_chance.clamp(0.0, 1.0)) {
            let speed = if rng.gen_bool(0.5) { grid.cell_size } else { -grid.cell_size };
            let velocity = if rng.gen_bool(0.5) { (speed, 0) } else { (0, speed) };
            Obstacle::moving(pos, velocity)
        } else {
            Obstacle::fixed(pos)
        };
        tracing::debug!(?obstacle, "obstacle spawned");
        self.obstacles.push(obstacle);
        Some(obstacle)
    }

    /// Move every moving obstacle one tick
    pub fn advance(&mut self, grid: &GridConfig) {
        self.obstacles = self.obstacles.iter().map(|o| o.advanced(grid)).collect();
    }
}
