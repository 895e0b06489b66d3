use std::time::Duration;

use super::config::TimingConfig;

/// Speed-up mode difficulty curve.
///
/// Every `window` ticks the interval drops by `step` until it reaches
/// `floor`. It never rises again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyRamp {
    step_ms: u64,
    floor_ms: u64,
    window: u32,
    interval_ms: u64,
    level: u32,
    ticks_in_window: u32,
}

impl DifficultyRamp {
    pub fn new(base_ms: u64, step_ms: u64, floor_ms: u64, window: u32) -> Self {
        Self {
            step_ms,
            floor_ms,
            window: window.max(1),
            interval_ms: base_ms,
            level: 1,
            ticks_in_window: 0,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(
            timing.base_interval_ms,
            timing.ramp_step_ms,
            timing.ramp_floor_ms,
            timing.ramp_window_ticks,
        )
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Visible speed level, starting at 1
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_at_floor(&self) -> bool {
        self.interval_ms <= self.floor_ms
    }

    /// Count one tick. Returns the new interval when it just changed.
    pub fn tick(&mut self) -> Option<Duration> {
        self.ticks_in_window += 1;
        if self.ticks_in_window < self.window {
            return None;
        }
        self.ticks_in_window = 0;

        if self.is_at_floor() {
            return None;
        }
        self.interval_ms = self.interval_ms.saturating_sub(self.step_ms).max(self.floor_ms);
        self.level += 1;
        Some(self.interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_per_window() {
        let mut ramp = DifficultyRamp::new(120, 5, 15, 3);
        assert_eq!(ramp.tick(), None);
        assert_eq!(ramp.tick(), None);
        assert_eq!(ramp.tick(), Some(Duration::from_millis(115)));
        assert_eq!(ramp.level(), 2);
    }

    #[test]
    fn test_reaches_floor_after_21_windows() {
        let window = 7;
        let mut ramp = DifficultyRamp::new(120, 5, 15, window);

        let mut previous = ramp.interval_ms();
        for _ in 0..(21 * window) {
            ramp.tick();
            assert!(ramp.interval_ms() <= previous);
            previous = ramp.interval_ms();
        }
        assert_eq!(ramp.interval_ms(), 15);
        assert_eq!(ramp.level(), 22);

        for _ in 0..(5 * window) {
            assert_eq!(ramp.tick(), None);
        }
        assert_eq!(ramp.interval_ms(), 15);
        assert_eq!(ramp.level(), 22);
    }

    #[test]
    fn test_not_at_floor_one_tick_early() {
        let window = 4;
        let mut ramp = DifficultyRamp::new(120, 5, 15, window);
        for _ in 0..(21 * window - 1) {
            ramp.tick();
        }
        assert_eq!(ramp.interval_ms(), 20);
    }

    #[test]
    fn test_step_never_undershoots_floor() {
        let mut ramp = DifficultyRamp::new(20, 7, 15, 1);
        assert_eq!(ramp.tick(), Some(Duration::from_millis(15)));
        assert_eq!(ramp.tick(), None);
    }

    #[test]
    fn test_default_timing() {
        let mut ramp = DifficultyRamp::from_config(&TimingConfig::default());
        assert_eq!(ramp.interval_ms(), 120);
        assert_eq!(ramp.level(), 1);
        for _ in 0..199 {
            assert_eq!(ramp.tick(), None);
        }
        assert_eq!(ramp.tick(), Some(Duration::from_millis(115)));
    }
}
