//! Best-score persistence.
//!
//! The score file is line oriented. The first `GameMode::ALL.len()` lines are
//! the best-score block, `<label>最高分:<score>`, in mode enumeration order.
//! Every following line is a session history record and is carried over
//! unchanged on each rewrite.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::mode::GameMode;

const BEST_SUFFIX: &str = "最高分:";

/// One completed session, appended to the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub score: u32,
    pub mode: GameMode,
    pub elapsed_secs: u64,
}

impl SessionRecord {
    /// Record stamped with the current local time
    pub fn now(score: u32, mode: GameMode, elapsed_secs: u64) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            score,
            mode,
            elapsed_secs,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "时间: {}  分数: {}  模式: {}  已玩时间: {}秒",
            self.timestamp,
            self.score,
            self.mode.label(),
            self.elapsed_secs
        )
    }
}

/// Best score per mode plus session history
pub trait ScoreStore {
    /// Best score for `mode`; zero when none was recorded
    fn get(&self, mode: GameMode) -> u32;

    /// Store `score` if it beats the current best. Returns whether it did.
    fn record_if_best(&mut self, mode: GameMode, score: u32) -> Result<bool>;

    fn append_history(&mut self, record: &SessionRecord) -> Result<()>;
}

fn best_line(mode: GameMode, score: u32) -> String {
    format!("{}{}{}", mode.label(), BEST_SUFFIX, score)
}

enum BestLine {
    Valid(GameMode, u32),
    Malformed,
    NotBest,
}

fn parse_best_line(line: &str) -> BestLine {
    for mode in GameMode::ALL {
        let Some(rest) = line
            .strip_prefix(mode.label())
            .and_then(|rest| rest.strip_prefix(BEST_SUFFIX))
        else {
            continue;
        };
        return match rest.trim().parse::<u32>() {
            Ok(score) => BestLine::Valid(mode, score),
            Err(_) => BestLine::Malformed,
        };
    }
    BestLine::NotBest
}

/// `ScoreStore` backed by a `scores.txt`-style file
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
    best: HashMap<GameMode, u32>,
    history: Vec<String>,
}

impl FileScoreStore {
    /// Open the store at `path`.
    ///
    /// A missing or unreadable file, or malformed best lines, fall back to
    /// zero for the affected modes.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            best: HashMap::new(),
            history: Vec::new(),
        };

        match std::fs::read_to_string(&store.path) {
            Ok(contents) => store.parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?store.path, "no score file yet");
            }
            Err(e) => {
                tracing::warn!(path = ?store.path, error = %e, "failed to read score file");
            }
        }
        store
    }

    fn parse(&mut self, contents: &str) {
        let block_len = GameMode::ALL.len();
        for (index, line) in contents.lines().enumerate() {
            if index >= block_len {
                self.history.push(line.to_string());
                continue;
            }
            match parse_best_line(line) {
                BestLine::Valid(mode, score) => {
                    self.best.insert(mode, score);
                }
                BestLine::Malformed => {
                    tracing::warn!(line, "ignoring malformed best-score line");
                }
                BestLine::NotBest => self.history.push(line.to_string()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// History lines in file order
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Rewrite the file: best block first, then every history line
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let mut contents = String::new();
        for mode in GameMode::ALL {
            contents.push_str(&best_line(mode, self.get(mode)));
            contents.push('\n');
        }
        for line in &self.history {
            contents.push_str(line);
            contents.push('\n');
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write scores to {:?}", self.path))?;
        Ok(())
    }
}

impl ScoreStore for FileScoreStore {
    fn get(&self, mode: GameMode) -> u32 {
        self.best.get(&mode).copied().unwrap_or(0)
    }

    fn record_if_best(&mut self, mode: GameMode, score: u32) -> Result<bool> {
        if score <= self.get(mode) {
            return Ok(false);
        }
        self.best.insert(mode, score);
        self.flush()?;
        tracing::info!(mode = mode.label(), score, "new best score saved");
        Ok(true)
    }

    fn append_history(&mut self, record: &SessionRecord) -> Result<()> {
        self.history.push(record.to_line());
        self.flush()
    }
}

/// In-memory `ScoreStore`, for tests and for running without a score file
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: HashMap<GameMode, u32>,
    history: Vec<SessionRecord>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, mode: GameMode) -> u32 {
        self.best.get(&mode).copied().unwrap_or(0)
    }

    fn record_if_best(&mut self, mode: GameMode, score: u32) -> Result<bool> {
        if score <= self.get(mode) {
            return Ok(false);
        }
        self.best.insert(mode, score);
        Ok(true)
    }

    fn append_history(&mut self, record: &SessionRecord) -> Result<()> {
        self.history.push(record.clone());
        Ok(())
    }
}
