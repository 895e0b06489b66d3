//! Grid Snake - a tick-driven snake engine with four game modes
//!
//! This library provides:
//! - Core game logic and the session state machine (game module)
//! - Keyboard mapping (input module)
//! - TUI rendering (render module)
//! - Session timing (metrics module)
//! - The interactive play loop (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
