//! Tick source abstraction.
//!
//! The engine never owns a timer. It asks a `Scheduler` for a repeating tick
//! and cancels the previous one first, so at most one schedule is live.

use std::time::Duration;

/// Identifies one repeating schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

pub trait Scheduler {
    /// Start delivering ticks every `period`
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle;

    /// Stop the schedule behind `handle`; unknown handles are ignored
    fn cancel(&mut self, handle: TickHandle);
}

/// Records the live schedule for a driver loop to follow.
///
/// The driver polls [`TickSchedule::active`] after handing the engine a
/// command or tick and rebuilds its timer when the handle changes.
#[derive(Debug, Clone, Default)]
pub struct TickSchedule {
    next_id: u64,
    active: Option<(TickHandle, Duration)>,
    overlaps: usize,
}

impl TickSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live schedule, if any
    pub fn active(&self) -> Option<(TickHandle, Duration)> {
        self.active
    }

    pub fn period(&self) -> Option<Duration> {
        self.active.map(|(_, period)| period)
    }

    /// Times a schedule was started while another was still live
    pub fn overlaps(&self) -> usize {
        self.overlaps
    }
}

impl Scheduler for TickSchedule {
    fn schedule_repeating(&mut self, period: Duration) -> TickHandle {
        if self.active.is_some() {
            self.overlaps += 1;
            tracing::warn!("tick scheduled while another schedule is live");
        }
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.active = Some((handle, period));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if matches!(self.active, Some((live, _)) if live == handle) {
            self.active = None;
        }
    }
}
