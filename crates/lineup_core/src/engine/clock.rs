//! Countdown game clock.
//!
//! The clock is a pure state machine. It does not own a timer; whoever drives
//! it (the live session's ticker, or a test) calls [`Clock::tick`] once per
//! elapsed second and [`Clock::advance_by`] after a suspension.

use serde::{Deserialize, Serialize};

/// Time reported by a tick or catch-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAdvance {
    /// Seconds actually removed from the countdown.
    pub seconds: u32,
    /// The countdown reached zero and the clock stopped.
    pub expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    duration_seconds: u32,
    remaining_seconds: u32,
    is_running: bool,
}

impl Clock {
    pub fn new(duration_seconds: u32) -> Self {
        Self { duration_seconds, remaining_seconds: duration_seconds, is_running: false }
    }

    /// Rebuild from stored values; `remaining` is clamped to the duration.
    pub fn restore(duration_seconds: u32, remaining_seconds: u32, is_running: bool) -> Self {
        let remaining_seconds = remaining_seconds.min(duration_seconds);
        Self { duration_seconds, remaining_seconds, is_running: is_running && remaining_seconds > 0 }
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_seconds.saturating_sub(self.remaining_seconds)
    }

    /// Returns true if the clock transitioned from stopped to running.
    pub fn start(&mut self) -> bool {
        if self.is_running {
            return false;
        }
        if self.remaining_seconds == 0 {
            self.remaining_seconds = self.duration_seconds;
        }
        // zero-length games have nothing to run
        self.is_running = self.remaining_seconds > 0;
        self.is_running
    }

    /// Returns true if the clock was running.
    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.is_running, false)
    }

    pub fn reset(&mut self) {
        self.pause();
        self.remaining_seconds = self.duration_seconds;
    }

    pub fn set_duration(&mut self, seconds: u32) {
        self.duration_seconds = seconds;
        if self.remaining_seconds == 0 && !self.is_running {
            self.remaining_seconds = seconds;
        }
    }

    /// One elapsed second. No-op unless running.
    pub fn tick(&mut self) -> Option<ClockAdvance> {
        self.advance(1)
    }

    /// Catch-up after the host stopped scheduling ticks.
    ///
    /// Applies `min(seconds, remaining)` at once. A running clock that does
    /// not reach zero stays running so the tick source can resume.
    pub fn advance_by(&mut self, seconds: u32) -> Option<ClockAdvance> {
        self.advance(seconds)
    }

    fn advance(&mut self, seconds: u32) -> Option<ClockAdvance> {
        if !self.is_running || seconds == 0 {
            return None;
        }
        let applied = seconds.min(self.remaining_seconds);
        self.remaining_seconds -= applied;
        let expired = self.remaining_seconds == 0;
        if expired {
            self.is_running = false;
        }
        if applied == 0 {
            return None;
        }
        Some(ClockAdvance { seconds: applied, expired })
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_mm_ss(self.remaining_seconds)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DURATION_SECS)
    }
}

/// `MM:SS` with minutes allowed past 59 (`125:00` for long durations).
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
