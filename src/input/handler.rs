use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::game::{Command, Direction, GameMode, GameStatus};

/// Maps key events to engine commands.
///
/// The mapping depends on the status: digits pick a mode in the menu but
/// mean restart/menu on the game-over screen.
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent, status: GameStatus) -> Option<Command> {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        // Space is held to accelerate; release is only reported by terminals
        // with keyboard enhancement
        if key.code == KeyCode::Char(' ') {
            return match key.kind {
                KeyEventKind::Press => Some(Command::AccelerateStart),
                KeyEventKind::Release => Some(Command::AccelerateStop),
                KeyEventKind::Repeat => None,
            };
        }
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(Command::Quit),
            KeyCode::Char('p') | KeyCode::Char('P') => return Some(Command::TogglePause),
            _ => {}
        }

        match status {
            GameStatus::ModeSelect => Self::menu_key(key.code),
            GameStatus::GameOver => Self::game_over_key(key.code),
            // Any key starts a fixed-mode session
            GameStatus::NotStarted => {
                Some(Self::direction_key(key.code).map_or(Command::TogglePause, Command::Turn))
            }
            _ => Self::direction_key(key.code).map(Command::Turn),
        }
    }

    fn direction_key(code: KeyCode) -> Option<Direction> {
        match code {
            // Movement - Arrow keys
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
            KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),

            _ => None,
        }
    }

    fn menu_key(code: KeyCode) -> Option<Command> {
        let KeyCode::Char(c) = code else {
            return None;
        };
        let index = c.to_digit(10)?;
        GameMode::from_menu_index(index as u8).map(Command::SelectMode)
    }

    fn game_over_key(code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('1') | KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
            KeyCode::Char('2') | KeyCode::Char('m') | KeyCode::Char('M') => {
                Some(Command::ReturnToMenu)
            }
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
