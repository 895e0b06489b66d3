use std::time::{Duration, Instant};

/// Elapsed play time for one session; paused time is not counted
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero and start counting
    pub fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(Instant::now());
    }

    /// Stop counting, keeping the time so far
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map(|since| since.elapsed()).unwrap_or_default()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }
}

/// `mm:ss`; minutes are not wrapped into hours
pub fn format_secs(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
