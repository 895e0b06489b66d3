use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::{GameMode, GameStatus, GridConfig, Position, Snapshot};
use crate::metrics::game_metrics::format_secs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    PlayerHead,
    PlayerBody,
    OpponentHead,
    OpponentBody,
    Primary,
    Shrink,
    Bonus,
    Obstacle,
}

impl Cell {
    fn span(self, flash: bool) -> Span<'static> {
        match self {
            Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
            Cell::PlayerHead if flash => Span::styled("■ ", Style::default().fg(Color::Red)),
            Cell::PlayerBody if flash => Span::styled("□ ", Style::default().fg(Color::Red)),
            Cell::PlayerHead => Span::styled(
                "■ ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Cell::PlayerBody => Span::styled("□ ", Style::default().fg(Color::Green)),
            Cell::OpponentHead => Span::styled(
                "■ ",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Cell::OpponentBody => Span::styled("□ ", Style::default().fg(Color::Magenta)),
            Cell::Primary => Span::styled(
                "O ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Cell::Shrink => Span::styled(
                "- ",
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Cell::Bonus => Span::styled(
                "$ ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Cell::Obstacle => Span::styled("█ ", Style::default().fg(Color::Gray)),
        }
    }
}

/// Paints a [`Snapshot`]; holds no game state of its own
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, snapshot: &Snapshot) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        if snapshot.status == GameStatus::ModeSelect {
            frame.render_widget(self.render_title(), chunks[0]);
            frame.render_widget(self.render_menu(snapshot), game_area);
            frame.render_widget(self.render_controls(snapshot.status), chunks[2]);
            return;
        }

        frame.render_widget(self.render_stats(snapshot), chunks[0]);
        frame.render_widget(self.render_grid(snapshot), game_area);

        match snapshot.status {
            GameStatus::GameOver => {
                let popup = centered(game_area, 44, 11);
                frame.render_widget(Clear, popup);
                frame.render_widget(self.render_game_over(snapshot), popup);
            }
            GameStatus::NotStarted => {
                let popup = centered(game_area, 36, 5);
                frame.render_widget(Clear, popup);
                let notice = self.render_notice("Press any key to start", Color::Green);
                frame.render_widget(notice, popup);
            }
            GameStatus::Paused => {
                let popup = centered(game_area, 36, 5);
                frame.render_widget(Clear, popup);
                let notice = self.render_notice("PAUSED - press P to resume", Color::Yellow);
                frame.render_widget(notice, popup);
            }
            _ => {}
        }

        frame.render_widget(self.render_controls(snapshot.status), chunks[2]);
    }

    fn render_grid(&self, snapshot: &Snapshot) -> Paragraph<'static> {
        let cells = paint(snapshot);
        let grid = &snapshot.grid;
        // Blink the player every few frames while dying
        let flash = snapshot.status == GameStatus::DeathAnimation
            && (snapshot.death_frame.0 / 4) % 2 == 0;

        let lines: Vec<Line> = cells
            .chunks(grid.columns.max(1) as usize)
            .map(|row| Line::from(row.iter().map(|cell| cell.span(flash)).collect::<Vec<_>>()))
            .collect();

        let title = match snapshot.status {
            GameStatus::DeathAnimation => " Crashed! ".to_string(),
            _ => format!(" {} ", snapshot.mode.label()),
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_title(&self) -> Paragraph<'static> {
        Paragraph::new(Line::from(Span::styled(
            "GRID SNAKE",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
    }

    fn render_menu(&self, snapshot: &Snapshot) -> Paragraph<'static> {
        let mut text = vec![
            Line::from(""),
            Line::from(Span::styled("Select a mode", Style::default().fg(Color::Yellow))),
            Line::from(""),
        ];
        for &(mode, best) in &snapshot.best_scores {
            text.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", mode.menu_index()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:<12}", mode.label()), Style::default().fg(Color::White)),
                Span::styled(format!("  best {}", best), Style::default().fg(Color::Gray)),
            ]));
        }

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .title(" Menu "),
        )
    }

    fn render_stats(&self, snapshot: &Snapshot) -> Paragraph<'static> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let mut spans = vec![
            Span::styled("Score: ", label),
            Span::styled(snapshot.score.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(snapshot.best_score.to_string(), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(format_secs(snapshot.elapsed_secs), value),
        ];
        if let Some(level) = snapshot.speed_level {
            spans.push(Span::raw("    "));
            spans.push(Span::styled("Speed: ", label));
            spans.push(Span::styled(level.to_string(), value));
        }
        if snapshot.mode == GameMode::Ai {
            spans.push(Span::raw("    "));
            spans.push(Span::styled("AI: ", label));
            let opponent = match &snapshot.opponent {
                Some(opponent) => format!("length {}", opponent.body.len() + 1),
                None => "eliminated".to_string(),
            };
            spans.push(Span::styled(opponent, value));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn render_notice(&self, message: &'static str, color: Color) -> Paragraph<'static> {
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                message,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)))
    }

    fn render_game_over(&self, snapshot: &Snapshot) -> Paragraph<'static> {
        let key = |k: &'static str, color: Color| {
            Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
        };
        let gray = Style::default().fg(Color::Gray);

        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.score.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Best: ", Style::default().fg(Color::Yellow)),
                Span::styled(snapshot.best_score.to_string(), Style::default().fg(Color::White)),
                Span::styled("    Time: ", Style::default().fg(Color::Yellow)),
                Span::styled(format_secs(snapshot.elapsed_secs), Style::default().fg(Color::White)),
            ]),
        ];
        if snapshot.score > 0 && snapshot.score >= snapshot.best_score {
            text.push(Line::from(Span::styled(
                "New best!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
        } else {
            text.push(Line::from(""));
        }
        text.push(Line::from(""));
        text.push(Line::from(vec![
            key("1", Color::Green),
            Span::styled(" restart   ", gray),
            key("2", Color::Cyan),
            Span::styled(" menu   ", gray),
            key("Q", Color::Red),
            Span::styled(" quit", gray),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self, status: GameStatus) -> Paragraph<'static> {
        let text = match status {
            GameStatus::ModeSelect => Line::from(vec![
                Span::styled("1-4", Style::default().fg(Color::Cyan)),
                Span::raw(" to pick a mode | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ]),
            _ => Line::from(vec![
                Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
                Span::raw(" or "),
                Span::styled("WASD", Style::default().fg(Color::Cyan)),
                Span::raw(" to move | "),
                Span::styled("Space", Style::default().fg(Color::Cyan)),
                Span::raw(" to speed up | "),
                Span::styled("P", Style::default().fg(Color::Yellow)),
                Span::raw(" to pause | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ]),
        };

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_index(grid: &GridConfig, pos: Position) -> Option<usize> {
    if !grid.contains(pos) {
        return None;
    }
    let (column, row) = grid.cell_of(pos);
    Some((row * grid.columns + column) as usize)
}

/// Row-major cell map; later layers overwrite earlier ones
fn paint(snapshot: &Snapshot) -> Vec<Cell> {
    let grid = &snapshot.grid;
    let mut cells = vec![Cell::Empty; grid.cell_count()];
    let mut set = |pos: Position, cell: Cell| {
        if let Some(index) = cell_index(grid, pos) {
            cells[index] = cell;
        }
    };

    for (pos, cell) in [
        (snapshot.items.primary, Cell::Primary),
        (snapshot.items.shrink, Cell::Shrink),
        (snapshot.items.bonus, Cell::Bonus),
    ] {
        if let Some(pos) = pos {
            set(pos, cell);
        }
    }
    for obstacle in &snapshot.obstacles {
        set(obstacle.pos, Cell::Obstacle);
    }
    if let Some(opponent) = &snapshot.opponent {
        for &segment in &opponent.body {
            set(segment, Cell::OpponentBody);
        }
        set(opponent.head, Cell::OpponentHead);
    }
    for &segment in &snapshot.player.body {
        set(segment, Cell::PlayerBody);
    }
    set(snapshot.player.head, Cell::PlayerHead);

    cells
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
