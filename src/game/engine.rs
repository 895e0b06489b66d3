use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::{
    action::{Command, Direction},
    ai,
    collision::{self, CollisionType, OpponentOutcome},
    config::{GameConfig, GridConfig},
    items::{self, ItemKind, Items},
    mode::{GameMode, GameStatus},
    obstacle::{Obstacle, ObstacleField},
    ramp::DifficultyRamp,
    scheduler::{Scheduler, TickHandle},
    state::{Position, Snake},
    store::{ScoreStore, SessionRecord},
};
use crate::metrics::SessionClock;

/// Which snake an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Opponent,
}

/// Discrete notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    StatusChanged { from: GameStatus, to: GameStatus },
    ScoreChanged(u32),
    ItemConsumed { by: ActorKind, kind: ItemKind },
    OpponentEliminated { gained: usize },
    PlayerDied(CollisionType),
    SpeedChanged { level: u32, interval: Duration },
    GameOver { mode: GameMode, score: u32, new_best: bool },
}

/// Read-only geometry of one snake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorView {
    pub head: Position,
    pub body: Vec<Position>,
    pub direction: Direction,
}

impl From<&Snake> for ActorView {
    fn from(snake: &Snake) -> Self {
        Self {
            head: snake.head(),
            body: snake.body().to_vec(),
            direction: snake.direction(),
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub status: GameStatus,
    pub mode: GameMode,
    pub elapsed_secs: u64,
    pub score: u32,
    pub best_score: u32,
    /// Best score of every mode, in menu order
    pub best_scores: Vec<(GameMode, u32)>,
    pub player: ActorView,
    pub opponent: Option<ActorView>,
    pub obstacles: Vec<Obstacle>,
    pub items: Items,
    /// Present in speed-up mode only
    pub speed_level: Option<u32>,
    pub death_cause: Option<CollisionType>,
    /// Death animation progress as (frame, total)
    pub death_frame: (u32, u32),
    pub grid: GridConfig,
}

/// Per-session entities, rebuilt on every (re)start
#[derive(Debug, Clone)]
struct Session {
    player: Snake,
    opponent: Option<Snake>,
    items: Items,
    obstacles: ObstacleField,
    ramp: DifficultyRamp,
    score: u32,
}

impl Session {
    fn new(config: &GameConfig, mode: GameMode) -> Self {
        let grid = &config.grid;
        let column = grid.columns / 2;
        let row = grid.rows / 2;
        let player = Snake::new(grid.cell(column, row), grid.cell_size);
        let opponent = mode.has_opponent().then(|| {
            let opponent_row = (row - config.opponent_row_offset).max(0);
            Snake::new(grid.cell(column, opponent_row), grid.cell_size)
        });

        Self {
            player,
            opponent,
            items: Items::default(),
            obstacles: ObstacleField::new(),
            ramp: DifficultyRamp::from_config(&config.timing),
            score: 0,
        }
    }

    fn is_occupied(&self, pos: Position) -> bool {
        self.player.contains(pos)
            || self.opponent.as_ref().is_some_and(|o| o.contains(pos))
            || self.obstacles.is_obstacle_at(pos)
            || self.items.is_item_at(pos)
    }
}

/// The game orchestrator.
///
/// Owns every entity of the running session and drives the state machine.
/// Ticks come from outside through [`GameEngine::tick`]; the engine only
/// tells its [`Scheduler`] when and how often it wants them.
pub struct GameEngine<S: ScoreStore, T: Scheduler> {
    config: GameConfig,
    mode: GameMode,
    status: GameStatus,
    session: Session,
    store: S,
    scheduler: T,
    tick_handle: Option<TickHandle>,
    rng: StdRng,
    clock: SessionClock,
    pending_turn: Option<Direction>,
    accelerating: bool,
    death_frame: u32,
    death_cause: Option<CollisionType>,
    events: Vec<GameEvent>,
    quit_requested: bool,
}

impl<S: ScoreStore, T: Scheduler> GameEngine<S, T> {
    /// Create an engine waiting in mode selection
    pub fn new(config: GameConfig, store: S, scheduler: T) -> Self {
        let session = Session::new(&config, GameMode::Classic);
        Self {
            config,
            mode: GameMode::Classic,
            status: GameStatus::ModeSelect,
            session,
            store,
            scheduler,
            tick_handle: None,
            rng: StdRng::from_entropy(),
            clock: SessionClock::new(),
            pending_turn: None,
            accelerating: false,
            death_frame: 0,
            death_cause: None,
            events: Vec::new(),
            quit_requested: false,
        }
    }

    /// Create an engine for a fixed mode, idle until the first command
    pub fn with_mode(config: GameConfig, store: S, scheduler: T, mode: GameMode) -> Self {
        let mut engine = Self::new(config, store, scheduler);
        engine.reset_session(mode);
        engine.status = GameStatus::NotStarted;
        engine
    }

    /// Replace the random source with a seeded one
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            mode: self.mode,
            elapsed_secs: self.clock.elapsed_secs(),
            score: self.session.score,
            best_score: self.store.get(self.mode),
            best_scores: GameMode::ALL.iter().map(|&mode| (mode, self.store.get(mode))).collect(),
            player: ActorView::from(&self.session.player),
            opponent: self.session.opponent.as_ref().map(ActorView::from),
            obstacles: self.session.obstacles.obstacles().to_vec(),
            items: self.session.items.clone(),
            speed_level: self.mode.has_ramp().then(|| self.session.ramp.level()),
            death_cause: self.death_cause,
            death_frame: (self.death_frame, self.config.timing.death_animation_frames),
            grid: self.config.grid,
        }
    }

    /// Apply one input command. Turns are queued for the next tick.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Quit => {
                self.quit_requested = true;
                return;
            }
            Command::AccelerateStop => {
                self.accelerating = false;
                return;
            }
            _ => {}
        }

        match (self.status, command) {
            (GameStatus::NotStarted, command) => {
                self.set_status(GameStatus::Running);
                if let Command::Turn(direction) = command {
                    self.pending_turn = Some(direction);
                }
            }
            (GameStatus::ModeSelect, Command::SelectMode(mode)) => self.start_session(mode),
            (GameStatus::Running, Command::Turn(direction)) => self.pending_turn = Some(direction),
            (GameStatus::Running, Command::AccelerateStart) => self.accelerating = true,
            (GameStatus::Running, Command::TogglePause) => self.set_status(GameStatus::Paused),
            (GameStatus::Paused, Command::TogglePause) => self.set_status(GameStatus::Running),
            (GameStatus::GameOver, Command::Restart) => self.start_session(self.mode),
            (GameStatus::GameOver, Command::ReturnToMenu) => {
                self.set_status(GameStatus::ModeSelect)
            }
            _ => {}
        }
    }

    /// One tick from the scheduler
    pub fn tick(&mut self) {
        match self.status {
            GameStatus::Running => self.step(),
            GameStatus::DeathAnimation => {
                self.death_frame += 1;
                if self.death_frame >= self.config.timing.death_animation_frames {
                    self.set_status(GameStatus::GameOver);
                }
            }
            _ => tracing::trace!(status = ?self.status, "ignoring tick"),
        }
    }

    fn start_session(&mut self, mode: GameMode) {
        self.reset_session(mode);
        tracing::info!(mode = mode.label(), "session started");
        self.set_status(GameStatus::Running);
    }

    fn reset_session(&mut self, mode: GameMode) {
        self.mode = mode;
        self.session = Session::new(&self.config, mode);
        self.pending_turn = None;
        self.accelerating = false;
        self.death_frame = 0;
        self.death_cause = None;
        self.clock = SessionClock::new();
        self.spawn_primary();
    }

    fn tick_interval(&self) -> Duration {
        if self.mode.has_ramp() {
            self.session.ramp.interval()
        } else {
            self.config.timing.base_interval()
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Swap the live schedule for one at `period`
    fn reschedule(&mut self, period: Duration) {
        self.cancel_tick();
        self.tick_handle = Some(self.scheduler.schedule_repeating(period));
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status == status {
            return;
        }
        let from = self.status;
        self.status = status;
        tracing::info!(?from, to = ?status, "status changed");
        self.events.push(GameEvent::StatusChanged { from, to: status });

        match status {
            GameStatus::Running => {
                self.reschedule(self.tick_interval());
                if from == GameStatus::Paused {
                    self.clock.resume();
                } else {
                    self.clock.start();
                }
            }
            GameStatus::Paused => {
                self.cancel_tick();
                self.clock.pause();
            }
            GameStatus::DeathAnimation => {
                self.clock.pause();
                self.accelerating = false;
                self.death_frame = 0;
                self.reschedule(self.config.timing.death_frame_interval());
            }
            GameStatus::GameOver => {
                self.cancel_tick();
                self.clock.pause();
                self.persist_session();
            }
            GameStatus::ModeSelect | GameStatus::NotStarted => self.cancel_tick(),
        }
    }

    fn persist_session(&mut self) {
        let score = self.session.score;
        let record = SessionRecord::now(score, self.mode, self.clock.elapsed_secs());
        if let Err(e) = self.store.append_history(&record) {
            tracing::warn!(error = %e, "failed to append session history");
        }
        let new_best = match self.store.record_if_best(self.mode, score) {
            Ok(new_best) => new_best,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save best score");
                false
            }
        };
        self.events.push(GameEvent::GameOver {
            mode: self.mode,
            score,
            new_best,
        });
    }

    /// One simulation step in the running state
    fn step(&mut self) {
        if let Some(direction) = self.pending_turn.take() {
            self.session.player.turn(direction);
        }

        self.session.player.move_forward();
        self.consume_player_items();

        if self.mode.has_opponent() {
            self.step_opponent();
        }

        if self.accelerating
            && self.player_collision().is_none()
            && !self.opponent_kills_player()
        {
            self.session.player.move_forward();
            self.consume_player_items();
        }

        if let Some(cause) = self.resolve_opponent_contact() {
            self.kill_player(cause);
            return;
        }

        if self.mode.has_obstacles() {
            self.step_obstacles();
        }

        self.spawn_items();

        if self.mode.has_ramp() {
            if let Some(interval) = self.session.ramp.tick() {
                let level = self.session.ramp.level();
                tracing::info!(level, interval_ms = interval.as_millis() as u64, "speed up");
                self.reschedule(interval);
                self.events.push(GameEvent::SpeedChanged { level, interval });
            }
        }

        if let Some(cause) = self.player_collision() {
            self.kill_player(cause);
        }
    }

    fn player_collision(&self) -> Option<CollisionType> {
        let obstacles: &[Obstacle] = if self.mode.has_obstacles() {
            self.session.obstacles.obstacles()
        } else {
            &[]
        };
        collision::check_player(&self.session.player, &self.config.grid, obstacles)
    }

    fn opponent_kills_player(&self) -> bool {
        self.session.opponent.as_ref().is_some_and(|opponent| {
            matches!(
                collision::resolve_opponent(&self.session.player, opponent),
                OpponentOutcome::PlayerDies(_)
            )
        })
    }

    fn kill_player(&mut self, cause: CollisionType) {
        tracing::info!(?cause, score = self.session.score, "player died");
        self.death_cause = Some(cause);
        self.events.push(GameEvent::PlayerDied(cause));
        self.set_status(GameStatus::DeathAnimation);
    }

    fn add_score(&mut self, points: u32) {
        self.session.score += points;
        self.events.push(GameEvent::ScoreChanged(self.session.score));
    }

    fn consume_player_items(&mut self) {
        let head = self.session.player.head();
        let tolerance = self.config.items.pickup_tolerance;

        if self.session.items.take_near(ItemKind::Primary, head, tolerance).is_some() {
            self.session.player.grow();
            self.add_score(1);
            self.item_consumed(ActorKind::Player, ItemKind::Primary);
        }
        if self.session.items.take_near(ItemKind::Shrink, head, tolerance).is_some() {
            self.session.player.shrink(self.config.items.shrink_amount);
            self.item_consumed(ActorKind::Player, ItemKind::Shrink);
        }
        if self.session.items.take_near(ItemKind::Bonus, head, tolerance).is_some() {
            self.session.player.grow();
            self.session.player.add_segment();
            self.add_score(2);
            self.item_consumed(ActorKind::Player, ItemKind::Bonus);
        }
    }

    fn item_consumed(&mut self, by: ActorKind, kind: ItemKind) {
        tracing::debug!(?by, ?kind, "item consumed");
        self.events.push(GameEvent::ItemConsumed { by, kind });
    }

    /// Greedy move toward the primary item, then the opponent's pickups.
    /// Skipped on ticks without a primary item.
    fn step_opponent(&mut self) {
        let grid = self.config.grid;
        let tolerance = self.config.items.pickup_tolerance;
        let target = self.session.items.primary;
        let Some(opponent) = self.session.opponent.as_mut() else {
            return;
        };
        let Some(direction) = ai::steer(opponent.head(), target, opponent.direction()) else {
            return;
        };

        opponent.force_turn(direction);
        opponent.move_forward();
        opponent.clamp_into(|pos| grid.clamp(pos));

        let head = opponent.head();
        let mut consumed = Vec::new();
        if self.session.items.take_near(ItemKind::Primary, head, tolerance).is_some() {
            opponent.grow();
            consumed.push(ItemKind::Primary);
        }
        if self.session.items.take_near(ItemKind::Shrink, head, tolerance).is_some() {
            opponent.shrink(self.config.items.shrink_amount);
            consumed.push(ItemKind::Shrink);
        }
        for kind in consumed {
            self.item_consumed(ActorKind::Opponent, kind);
        }
    }

    /// Returns the cause when the contact kills the player
    fn resolve_opponent_contact(&mut self) -> Option<CollisionType> {
        let opponent = self.session.opponent.as_ref()?;
        match collision::resolve_opponent(&self.session.player, opponent) {
            OpponentOutcome::None => None,
            OpponentOutcome::PlayerDies(cause) => Some(cause),
            OpponentOutcome::OpponentEliminated { length } => {
                self.session.opponent = None;
                for _ in 0..length {
                    self.session.player.add_segment();
                }
                self.add_score(length as u32);
                tracing::info!(gained = length, "opponent eliminated");
                self.events.push(GameEvent::OpponentEliminated { gained: length });
                None
            }
        }
    }

    fn step_obstacles(&mut self) {
        let player = &self.session.player;
        let opponent = &self.session.opponent;
        let items = &self.session.items;
        self.session.obstacles.spawn_tick(
            &mut self.rng,
            &self.config.grid,
            &self.config.obstacles,
            |pos| {
                player.contains(pos)
                    || opponent.as_ref().is_some_and(|o| o.contains(pos))
                    || items.is_item_at(pos)
            },
        );
        self.session.obstacles.advance(&self.config.grid);
    }

    fn spawn_primary(&mut self) {
        if self.session.items.primary.is_some() {
            return;
        }
        let session = &self.session;
        let pos = items::place(
            &mut self.rng,
            &self.config.grid,
            self.config.items.placement_attempts,
            |pos| session.is_occupied(pos),
        );
        if pos.is_none() {
            tracing::warn!("no free cell for the primary item");
        }
        self.session.items.primary = pos;
    }

    fn spawn_items(&mut self) {
        self.spawn_primary();

        let attempts = self.config.items.placement_attempts;
        for (kind, chance) in [
            (ItemKind::Shrink, self.config.items.shrink_spawn_chance),
            (ItemKind::Bonus, self.config.items.bonus_spawn_chance),
        ] {
            if self.session.items.get(kind).is_some() {
                continue;
            }
            if !self.rng.gen_bool(chance.clamp(0.0, 1.0)) {
                continue;
            }
            let session = &self.session;
            let pos = items::sample(&mut self.rng, &self.config.grid, attempts, |pos| {
                session.is_occupied(pos)
            });
            *self.session.items.slot_mut(kind) = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scheduler::TickSchedule;
    use crate::game::store::MemoryScoreStore;

    type TestEngine = GameEngine<MemoryScoreStore, TickSchedule>;

    fn engine() -> TestEngine {
        let mut engine = GameEngine::new(
            GameConfig::without_random_items(),
            MemoryScoreStore::new(),
            TickSchedule::new(),
        );
        engine.reseed(1234);
        engine
    }

    fn running(mode: GameMode) -> TestEngine {
        let mut engine = engine();
        engine.handle(Command::SelectMode(mode));
        assert_eq!(engine.status(), GameStatus::Running);
        engine
    }

    /// Park the primary item where the player cannot reach it this tick
    fn park_primary(engine: &mut TestEngine) {
        let grid = engine.config.grid;
        engine.session.items.primary = Some(grid.cell(0, grid.rows - 1));
    }

    #[test]
    fn test_starts_in_mode_select() {
        let engine = engine();
        assert_eq!(engine.status(), GameStatus::ModeSelect);
        assert!(engine.scheduler().active().is_none());
    }

    #[test]
    fn test_select_mode_starts_ticking() {
        let mut engine = engine();
        engine.handle(Command::Turn(Direction::Up));
        assert_eq!(engine.status(), GameStatus::ModeSelect);

        engine.handle(Command::SelectMode(GameMode::Classic));
        assert_eq!(engine.status(), GameStatus::Running);
        assert_eq!(engine.scheduler().period(), Some(Duration::from_millis(120)));
        assert!(engine.session.items.primary.is_some());
        assert_eq!(engine.session.player.len(), 3);
        assert!(engine.session.opponent.is_none());
    }

    #[test]
    fn test_fixed_mode_waits_for_any_input() {
        let mut engine = GameEngine::with_mode(
            GameConfig::without_random_items(),
            MemoryScoreStore::new(),
            TickSchedule::new(),
            GameMode::Ai,
        );
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert!(engine.scheduler().active().is_none());

        let head = engine.session.player.head();
        engine.tick();
        assert_eq!(engine.session.player.head(), head);

        engine.handle(Command::Turn(Direction::Down));
        assert_eq!(engine.status(), GameStatus::Running);
        assert!(engine.session.opponent.is_some());

        engine.tick();
        assert_eq!(engine.session.player.direction(), Direction::Down);
    }

    #[test]
    fn test_turn_applies_on_next_tick() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);
        let head = engine.session.player.head();

        engine.handle(Command::Turn(Direction::Down));
        assert_eq!(engine.session.player.direction(), Direction::Right);

        engine.tick();
        assert_eq!(engine.session.player.direction(), Direction::Down);
        assert_eq!(engine.session.player.head(), head.moved_in_direction(Direction::Down, 20));
    }

    #[test]
    fn test_reversal_request_ignored() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);
        engine.handle(Command::Turn(Direction::Left));
        engine.tick();
        assert_eq!(engine.session.player.direction(), Direction::Right);
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn test_boundary_death_then_game_over() {
        let mut engine = running(GameMode::Classic);
        let grid = engine.config.grid;
        engine.session.player = Snake::new(grid.cell(grid.columns - 1, 10), grid.cell_size);
        park_primary(&mut engine);

        engine.tick();
        assert_eq!(engine.status(), GameStatus::DeathAnimation);
        assert_eq!(engine.snapshot().death_cause, Some(CollisionType::Wall));
        assert_eq!(engine.scheduler().period(), Some(Duration::from_millis(15)));
        assert_eq!(engine.score(), 0);

        let frames = engine.config.timing.death_animation_frames;
        for _ in 0..frames - 1 {
            engine.tick();
        }
        assert_eq!(engine.status(), GameStatus::DeathAnimation);

        engine.tick();
        assert_eq!(engine.status(), GameStatus::GameOver);
        assert!(engine.scheduler().active().is_none());
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.store().history().len(), 1);
        assert_eq!(engine.scheduler().overlaps(), 0);

        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::PlayerDied(CollisionType::Wall)));
        assert!(events.contains(&GameEvent::GameOver {
            mode: GameMode::Classic,
            score: 0,
            new_best: false,
        }));
    }

    #[test]
    fn test_primary_pickup_and_growth_delay() {
        let mut engine = running(GameMode::Classic);
        let next_head = engine.session.player.head().moved_in_direction(Direction::Right, 20);
        engine.session.items.primary = Some(next_head);
        engine.drain_events();

        engine.tick();
        assert_eq!(engine.score(), 1);
        assert!(engine.session.player.is_growing());
        assert_eq!(engine.session.player.len(), 3);
        assert!(engine.drain_events().contains(&GameEvent::ScoreChanged(1)));

        park_primary(&mut engine);
        engine.tick();
        assert_eq!(engine.session.player.len(), 4);
        assert!(!engine.session.player.is_growing());
    }

    #[test]
    fn test_shrink_and_bonus_items() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);
        let head = engine.session.player.head();
        engine.session.items.shrink = Some(head.moved_in_direction(Direction::Right, 20));
        engine.session.items.bonus = Some(head.moved_in_direction(Direction::Right, 40));

        engine.tick();
        assert_eq!(engine.session.player.len(), 2);
        assert_eq!(engine.score(), 0);
        assert!(engine.session.items.shrink.is_none());

        engine.tick();
        assert_eq!(engine.score(), 2);
        assert_eq!(engine.session.player.len(), 3);
        assert!(engine.session.player.is_growing());
        assert!(engine.session.items.bonus.is_none());
    }

    #[test]
    fn test_pause_halts_ticks() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);

        engine.handle(Command::TogglePause);
        assert_eq!(engine.status(), GameStatus::Paused);
        assert!(engine.scheduler().active().is_none());

        let head = engine.session.player.head();
        engine.tick();
        assert_eq!(engine.session.player.head(), head);

        engine.handle(Command::TogglePause);
        assert_eq!(engine.status(), GameStatus::Running);
        assert_eq!(engine.scheduler().period(), Some(Duration::from_millis(120)));
        assert_eq!(engine.scheduler().overlaps(), 0);
    }

    #[test]
    fn test_same_status_is_noop() {
        let mut engine = running(GameMode::Classic);
        engine.drain_events();
        let handle = engine.tick_handle;
        engine.set_status(GameStatus::Running);
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.tick_handle, handle);
    }

    #[test]
    fn test_accelerate_moves_twice() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);
        let head = engine.session.player.head();

        engine.handle(Command::AccelerateStart);
        engine.tick();
        assert_eq!(engine.session.player.head(), head.moved_in_direction(Direction::Right, 40));

        engine.handle(Command::AccelerateStop);
        engine.tick();
        assert_eq!(engine.session.player.head(), head.moved_in_direction(Direction::Right, 60));
    }

    #[test]
    fn test_speed_up_reschedules() {
        let mut config = GameConfig::without_random_items();
        config.timing.ramp_window_ticks = 2;
        let mut engine = GameEngine::new(config, MemoryScoreStore::new(), TickSchedule::new());
        engine.reseed(99);
        engine.handle(Command::SelectMode(GameMode::SpeedUp));
        assert_eq!(engine.snapshot().speed_level, Some(1));

        for _ in 0..4 {
            park_primary(&mut engine);
            engine.tick();
        }
        assert_eq!(engine.status(), GameStatus::Running);
        assert_eq!(engine.scheduler().period(), Some(Duration::from_millis(110)));
        assert_eq!(engine.snapshot().speed_level, Some(3));
        assert_eq!(engine.scheduler().overlaps(), 0);

        engine.handle(Command::TogglePause);
        engine.handle(Command::TogglePause);
        assert_eq!(engine.scheduler().period(), Some(Duration::from_millis(110)));
    }

    #[test]
    fn test_classic_has_no_speed_level() {
        let engine = running(GameMode::Classic);
        assert_eq!(engine.snapshot().speed_level, None);
    }

    #[test]
    fn test_obstacles_spawn_on_free_cells() {
        let mut config = GameConfig::without_random_items();
        config.obstacles.spawn_interval_ticks = 1;
        config.obstacles.moving_chance = 0.0;
        let mut engine = GameEngine::new(config, MemoryScoreStore::new(), TickSchedule::new());
        engine.reseed(5);
        engine.handle(Command::SelectMode(GameMode::Obstacle));
        park_primary(&mut engine);

        engine.tick();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.obstacles.len(), 1);
        let obstacle = snapshot.obstacles[0].pos;
        assert!(!engine.session.player.contains(obstacle));
        assert_ne!(Some(obstacle), snapshot.items.primary);
    }

    #[test]
    fn test_obstacle_kills_player() {
        let mut engine = running(GameMode::Obstacle);
        park_primary(&mut engine);
        let next_head = engine.session.player.head().moved_in_direction(Direction::Right, 20);
        engine.session.obstacles.push(Obstacle::fixed(next_head));

        engine.tick();
        assert_eq!(engine.status(), GameStatus::DeathAnimation);
        assert_eq!(engine.death_cause, Some(CollisionType::Obstacle));
    }

    #[test]
    fn test_obstacles_ignored_outside_obstacle_mode() {
        let mut engine = running(GameMode::Classic);
        park_primary(&mut engine);
        let next_head = engine.session.player.head().moved_in_direction(Direction::Right, 20);
        engine.session.obstacles.push(Obstacle::fixed(next_head));

        engine.tick();
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn test_opponent_steers_toward_primary() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        let opponent_head = engine.session.opponent.as_ref().unwrap().head();
        let (column, row) = grid.cell_of(opponent_head);
        engine.session.items.primary = Some(grid.cell(column, row - 4));

        engine.tick();
        let opponent = engine.session.opponent.as_ref().unwrap();
        assert_eq!(opponent.direction(), Direction::Up);
        assert_eq!(opponent.head(), grid.cell(column, row - 1));
    }

    #[test]
    fn test_opponent_waits_without_primary() {
        let mut engine = running(GameMode::Ai);
        engine.session.items.primary = None;
        let opponent_head = engine.session.opponent.as_ref().unwrap().head();

        engine.tick();
        assert_eq!(engine.session.opponent.as_ref().unwrap().head(), opponent_head);
        assert!(engine.session.items.primary.is_some());
    }

    #[test]
    fn test_opponent_eats_primary() {
        let mut engine = running(GameMode::Ai);
        let opponent_head = engine.session.opponent.as_ref().unwrap().head();
        engine.session.items.primary = Some(opponent_head.moved_in_direction(Direction::Right, 20));

        engine.tick();
        assert!(engine.session.opponent.as_ref().unwrap().is_growing());
        assert_eq!(engine.score(), 0);
        assert!(engine.drain_events().contains(&GameEvent::ItemConsumed {
            by: ActorKind::Opponent,
            kind: ItemKind::Primary,
        }));
    }

    #[test]
    fn test_opponent_eats_shrink() {
        let mut engine = running(GameMode::Ai);
        let opponent_head = engine.session.opponent.as_ref().unwrap().head();
        engine.session.items.primary =
            Some(opponent_head.moved_in_direction(Direction::Right, 120));
        engine.session.items.shrink = Some(opponent_head.moved_in_direction(Direction::Right, 20));

        engine.tick();
        assert_eq!(engine.session.opponent.as_ref().unwrap().len(), 2);
        assert!(engine.session.items.shrink.is_none());
        assert_eq!(engine.session.player.len(), 3);
    }

    #[test]
    fn test_opponent_leaves_bonus() {
        let mut engine = running(GameMode::Ai);
        let opponent_head = engine.session.opponent.as_ref().unwrap().head();
        let bonus = opponent_head.moved_in_direction(Direction::Right, 20);
        engine.session.items.primary =
            Some(opponent_head.moved_in_direction(Direction::Right, 120));
        engine.session.items.bonus = Some(bonus);

        engine.tick();
        let opponent = engine.session.opponent.as_ref().unwrap();
        assert_eq!(opponent.head(), bonus);
        assert_eq!(opponent.len(), 3);
        assert_eq!(engine.session.items.bonus, Some(bonus));
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_opponent_clamped_into_bounds() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        let edge = grid.cell(grid.columns - 1, 5);
        engine.session.opponent = Some(Snake::with_direction(edge, Direction::Right, 2, 20));
        // Head already on the target: the opponent keeps heading right, off the edge
        engine.session.items.primary = Some(edge);

        engine.tick();
        let opponent = engine.session.opponent.as_ref().unwrap();
        assert!(opponent.points().all(|pos| grid.contains(pos)));
        assert_eq!(opponent.head(), edge);
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn test_accelerate_stops_on_opponent_body() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        engine.session.player = Snake::with_direction(grid.cell(10, 10), Direction::Right, 2, 20);
        engine.session.opponent =
            Some(Snake::with_direction(grid.cell(11, 9), Direction::Up, 2, 20));
        engine.session.items.primary = Some(grid.cell(11, 0));

        engine.handle(Command::AccelerateStart);
        engine.tick();
        assert_eq!(engine.status(), GameStatus::DeathAnimation);
        assert_eq!(engine.death_cause, Some(CollisionType::OpponentBody));
        assert_eq!(engine.session.player.head(), grid.cell(11, 10));
    }

    #[test]
    fn test_head_to_head_tie_keeps_both() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        engine.session.player = Snake::with_direction(grid.cell(10, 10), Direction::Right, 2, 20);
        engine.session.opponent =
            Some(Snake::with_direction(grid.cell(10, 10), Direction::Down, 2, 20));

        assert_eq!(engine.resolve_opponent_contact(), None);
        assert!(engine.session.opponent.is_some());
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_eliminating_opponent_grows_player() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        engine.session.player = Snake::with_direction(grid.cell(10, 10), Direction::Right, 3, 20);
        engine.session.opponent =
            Some(Snake::with_direction(grid.cell(9, 10), Direction::Down, 2, 20));

        assert_eq!(engine.resolve_opponent_contact(), None);
        assert!(engine.session.opponent.is_none());
        assert_eq!(engine.score(), 3);
        assert_eq!(engine.session.player.len(), 7);
        assert!(engine.drain_events().contains(&GameEvent::OpponentEliminated { gained: 3 }));
    }

    #[test]
    fn test_longer_opponent_kills_player() {
        let mut engine = running(GameMode::Ai);
        let grid = engine.config.grid;
        park_primary(&mut engine);
        engine.session.player = Snake::with_direction(grid.cell(10, 10), Direction::Right, 2, 20);
        engine.session.opponent =
            Some(Snake::with_direction(grid.cell(10, 10), Direction::Down, 5, 20));

        assert_eq!(engine.resolve_opponent_contact(), Some(CollisionType::HeadToHead));
    }

    #[test]
    fn test_restart_and_menu_from_game_over() {
        let mut engine = running(GameMode::SpeedUp);
        let grid = engine.config.grid;
        engine.session.player = Snake::new(grid.cell(grid.columns - 1, 4), grid.cell_size);
        engine.session.score = 7;
        park_primary(&mut engine);
        engine.tick();
        for _ in 0..engine.config.timing.death_animation_frames {
            engine.tick();
        }
        assert_eq!(engine.status(), GameStatus::GameOver);
        assert_eq!(engine.store().get(GameMode::SpeedUp), 7);
        assert_eq!(engine.snapshot().best_score, 7);

        engine.handle(Command::TogglePause);
        assert_eq!(engine.status(), GameStatus::GameOver);

        engine.handle(Command::Restart);
        assert_eq!(engine.status(), GameStatus::Running);
        assert_eq!(engine.mode(), GameMode::SpeedUp);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.session.player.len(), 3);
        assert_eq!(engine.snapshot().best_score, 7);

        engine.session.player = Snake::new(grid.cell(grid.columns - 1, 4), grid.cell_size);
        engine.session.score = 3;
        park_primary(&mut engine);
        engine.tick();
        for _ in 0..engine.config.timing.death_animation_frames {
            engine.tick();
        }
        assert_eq!(engine.store().get(GameMode::SpeedUp), 7);

        engine.handle(Command::ReturnToMenu);
        assert_eq!(engine.status(), GameStatus::ModeSelect);
        assert!(engine.scheduler().active().is_none());
    }

    #[test]
    fn test_quit_from_any_state() {
        let mut engine = engine();
        engine.handle(Command::Quit);
        assert!(engine.quit_requested());
    }

    #[test]
    fn test_stale_ticks_ignored() {
        let mut engine = engine();
        let head = engine.session.player.head();
        engine.tick();
        assert_eq!(engine.session.player.head(), head);
        assert_eq!(engine.status(), GameStatus::ModeSelect);
    }
}
