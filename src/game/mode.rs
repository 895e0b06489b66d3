use serde::{Deserialize, Serialize};

/// Game mode, selected once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Classic,
    Ai,
    SpeedUp,
    Obstacle,
}

impl GameMode {
    /// Enumeration order; also the order of the persisted best-score block
    pub const ALL: [GameMode; 4] = [
        GameMode::Classic,
        GameMode::Ai,
        GameMode::SpeedUp,
        GameMode::Obstacle,
    ];

    /// Label used in the score file and the HUD
    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Classic => "单人模式",
            GameMode::Ai => "AI对战模式",
            GameMode::SpeedUp => "持续加速模式",
            GameMode::Obstacle => "无尽障碍模式",
        }
    }

    /// Menu selection number, 1..=4
    pub fn menu_index(&self) -> u8 {
        match self {
            GameMode::Classic => 1,
            GameMode::Ai => 2,
            GameMode::SpeedUp => 3,
            GameMode::Obstacle => 4,
        }
    }

    pub fn from_menu_index(index: u8) -> Option<GameMode> {
        Self::ALL.into_iter().find(|mode| mode.menu_index() == index)
    }

    pub fn has_opponent(&self) -> bool {
        *self == GameMode::Ai
    }

    pub fn has_ramp(&self) -> bool {
        *self == GameMode::SpeedUp
    }

    pub fn has_obstacles(&self) -> bool {
        *self == GameMode::Obstacle
    }
}

/// Node of the game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Constructed with a fixed mode, waiting for any input
    NotStarted,
    ModeSelect,
    Running,
    Paused,
    DeathAnimation,
    GameOver,
}
