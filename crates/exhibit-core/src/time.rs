use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open time window `[start, start + duration)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub duration: f64,
}

impl TimeWindow {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether two half-open windows share any instant.
    ///
    /// Windows that merely touch (`[0, 10)` and `[10, 20)`) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Offset of an absolute time inside this window, clamped to `[0, duration]`.
    pub fn local_offset(&self, t: f64) -> f64 {
        (t - self.start).clamp(0.0, self.duration.max(0.0))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}
