//! Core game logic for the grid snake engine
//!
//! Everything here is free of terminal I/O. The engine is driven by
//! commands and externally scheduled ticks, which keeps it usable from
//! tests and from the interactive play mode alike.

pub mod action;
pub mod ai;
pub mod collision;
pub mod config;
pub mod engine;
pub mod items;
pub mod mode;
pub mod obstacle;
pub mod ramp;
pub mod scheduler;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use action::{Command, Direction};
pub use collision::CollisionType;
pub use config::{GameConfig, GridConfig};
pub use engine::{ActorKind, ActorView, GameEngine, GameEvent, Snapshot};
pub use items::{ItemKind, Items};
pub use mode::{GameMode, GameStatus};
pub use obstacle::{Obstacle, ObstacleKind};
pub use ramp::DifficultyRamp;
pub use scheduler::{Scheduler, TickHandle, TickSchedule};
pub use state::{Position, Snake};
pub use store::{FileScoreStore, MemoryScoreStore, ScoreStore, SessionRecord};
