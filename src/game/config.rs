use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::state::Position;

/// Playfield geometry shared by the simulation and the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of one cell in position units
    pub cell_size: i32,
    /// Position of the top-left playable cell
    pub origin_x: i32,
    pub origin_y: i32,
    /// Number of playable columns and rows
    pub columns: i32,
    pub rows: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 20,
            origin_x: 20,
            origin_y: 40,
            columns: 38,
            rows: 36,
        }
    }
}

impl GridConfig {
    /// Position of the cell at (column, row)
    pub fn cell(&self, column: i32, row: i32) -> Position {
        Position::new(
            self.origin_x + column * self.cell_size,
            self.origin_y + row * self.cell_size,
        )
    }

    /// Column and row of a position, relative to the origin
    pub fn cell_of(&self, pos: Position) -> (i32, i32) {
        (
            (pos.x - self.origin_x).div_euclid(self.cell_size),
            (pos.y - self.origin_y).div_euclid(self.cell_size),
        )
    }

    pub fn min_x(&self) -> i32 {
        self.origin_x
    }

    pub fn max_x(&self) -> i32 {
        self.origin_x + (self.columns - 1) * self.cell_size
    }

    pub fn min_y(&self) -> i32 {
        self.origin_y
    }

    pub fn max_y(&self) -> i32 {
        self.origin_y + (self.rows - 1) * self.cell_size
    }

    /// Check if a position lies inside the playable rectangle
    pub fn contains(&self, pos: Position) -> bool {
        (self.min_x()..=self.max_x()).contains(&pos.x)
            && (self.min_y()..=self.max_y()).contains(&pos.y)
    }

    /// Nearest in-bounds position
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.min_x(), self.max_x()),
            pos.y.clamp(self.min_y(), self.max_y()),
        )
    }

    pub fn cell_count(&self) -> usize {
        (self.columns.max(0) * self.rows.max(0)) as usize
    }

    /// All cell positions, row-major
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| self.cell(column, row)))
    }
}

/// Tick timing and difficulty ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Tick interval of every mode, and the speed-up mode's starting point
    pub base_interval_ms: u64,
    /// Speed-up mode: interval reduction per ramp window
    pub ramp_step_ms: u64,
    /// Speed-up mode: the interval never drops below this
    pub ramp_floor_ms: u64,
    /// Speed-up mode: ticks between reductions
    pub ramp_window_ticks: u32,
    /// Frames in the death animation
    pub death_animation_frames: u32,
    /// Frame interval during the death animation
    pub death_frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 120,
            ramp_step_ms: 5,
            ramp_floor_ms: 15,
            ramp_window_ticks: 200,
            death_animation_frames: 40,
            death_frame_interval_ms: 15,
        }
    }
}

impl TimingConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn death_frame_interval(&self) -> Duration {
        Duration::from_millis(self.death_frame_interval_ms)
    }
}

/// Consumable items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Maximum per-axis distance at which a head picks up an item
    pub pickup_tolerance: i32,
    /// Per-tick probability of spawning an absent shrink item
    pub shrink_spawn_chance: f64,
    /// Per-tick probability of spawning an absent bonus item
    pub bonus_spawn_chance: f64,
    /// Trailing segments removed by the shrink item
    pub shrink_amount: usize,
    /// Random attempts before falling back to a full scan of free cells
    pub placement_attempts: usize,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            pickup_tolerance: 10,
            shrink_spawn_chance: 0.005,
            bonus_spawn_chance: 0.01,
            shrink_amount: 1,
            placement_attempts: 1000,
        }
    }
}

/// Obstacle field (obstacle mode only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Ticks between spawn attempts
    pub spawn_interval_ticks: u32,
    /// Random placements tried per spawn attempt
    pub spawn_attempts: usize,
    /// Probability that a new obstacle moves
    pub moving_chance: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ticks: 50,
            spawn_attempts: 100,
            moving_chance: 0.5,
        }
    }
}

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub items: ItemConfig,
    pub obstacles: ObstacleConfig,
    /// Rows between the player's and the opponent's spawn row
    pub opponent_row_offset: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            timing: TimingConfig::default(),
            items: ItemConfig::default(),
            obstacles: ObstacleConfig::default(),
            opponent_row_offset: 5,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic configuration: no random shrink/bonus spawns
    pub fn without_random_items() -> Self {
        let mut config = Self::new();
        config.items.shrink_spawn_chance = 0.0;
        config.items.bonus_spawn_chance = 0.0;
        config
    }

    /// Load a configuration from a JSON file; absent fields keep defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig =
            serde_json::from_str(&json).context("Failed to deserialize game config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.grid.cell_size > 0, "cell_size must be positive");
        anyhow::ensure!(
            self.grid.columns >= 4 && self.grid.rows >= 4,
            "playfield must be at least 4x4 cells"
        );
        anyhow::ensure!(
            (1..=self.timing.base_interval_ms).contains(&self.timing.ramp_floor_ms),
            "ramp floor must be in 1..=base interval"
        );
        anyhow::ensure!(self.timing.ramp_window_ticks > 0, "ramp window must be positive");
        anyhow::ensure!(
            self.obstacles.spawn_interval_ticks > 0,
            "obstacle spawn interval must be positive"
        );
        Ok(())
    }
}
