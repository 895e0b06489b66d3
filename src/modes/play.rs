use anyhow::{Context, Result};
use crossterm::{
    event::{
        Event, EventStream, KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};

use crate::game::{
    Command, FileScoreStore, GameConfig, GameEngine, GameMode, GameStatus, TickHandle,
    TickSchedule,
};
use crate::input::InputHandler;
use crate::render::Renderer;

/// Interactive terminal session.
///
/// Drives the engine from a `tokio::select!` loop: key events become
/// commands, and the tick timer follows whatever schedule the engine has
/// asked its [`TickSchedule`] for.
pub struct PlayMode {
    engine: GameEngine<FileScoreStore, TickSchedule>,
    renderer: Renderer,
    input_handler: InputHandler,
    /// The terminal reports key releases
    key_releases: bool,
    /// Acceleration toggle, used when releases are not reported
    space_toggled: bool,
}

impl PlayMode {
    /// `mode` skips the menu and waits for a key in that mode
    pub fn new(config: GameConfig, store: FileScoreStore, mode: Option<GameMode>) -> Self {
        let scheduler = TickSchedule::new();
        let engine = match mode {
            Some(mode) => GameEngine::with_mode(config, store, scheduler, mode),
            None => GameEngine::new(config, store, scheduler),
        };

        Self {
            engine,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            key_releases: false,
            space_toggled: false,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.engine.reseed(seed);
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;

        self.key_releases = matches!(supports_keyboard_enhancement(), Ok(true));
        if self.key_releases {
            execute!(
                stderr,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .context("Failed to enable key release events")?;
        }
        tracing::info!(key_releases = self.key_releases, "terminal ready");

        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        let mut tick_timer: Option<Interval> = None;
        let mut live_handle: Option<TickHandle> = None;

        loop {
            self.sync_tick_timer(&mut tick_timer, &mut live_handle);

            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick, at the engine's current rate
                _ = next_tick(&mut tick_timer) => {
                    self.engine.tick();
                }

                // Render frame
                _ = render_timer.tick() => {
                    let snapshot = self.engine.snapshot();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &snapshot);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.engine.handle(Command::Quit);
                }
            }

            for event in self.engine.drain_events() {
                tracing::debug!(?event, "game event");
            }

            if self.engine.quit_requested() {
                break;
            }
        }

        Ok(())
    }

    /// Rebuild the tick timer whenever the engine swapped its schedule
    fn sync_tick_timer(&self, timer: &mut Option<Interval>, live: &mut Option<TickHandle>) {
        let active = self.engine.scheduler().active();
        let handle = active.map(|(handle, _)| handle);
        if handle == *live {
            return;
        }
        *live = handle;
        *timer = active.map(|(_, period)| {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        let status = self.engine.status();
        if status != GameStatus::Running {
            self.space_toggled = false;
        }
        let Some(mut command) = self.input_handler.handle_key_event(key, status) else {
            return;
        };

        // Toggle fallback; in NotStarted space still starts the session
        if !self.key_releases
            && key.code == KeyCode::Char(' ')
            && status != GameStatus::NotStarted
        {
            if status != GameStatus::Running {
                return;
            }
            self.space_toggled = !self.space_toggled;
            command = if self.space_toggled {
                Command::AccelerateStart
            } else {
                Command::AccelerateStop
            };
        }

        self.engine.handle(command);
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        if self.key_releases {
            execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
                .context("Failed to restore keyboard flags")?;
        }
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
