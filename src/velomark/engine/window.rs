//! Event-time window assignment

use super::types::Timestamp;

/// Half-open interval `[start, end)` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Timestamp carried by results of this window
    pub fn max_timestamp(&self) -> Timestamp {
        self.end - 1
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// No further event can land in the window once the watermark reaches its end
    pub fn is_closed_by(&self, watermark: Timestamp) -> bool {
        watermark >= self.end
    }
}

/// Tumbling windows of a fixed size aligned to the epoch
#[derive(Debug, Clone, Copy)]
pub struct FixedWindows {
    size_ms: i64,
}

impl FixedWindows {
    pub fn new(size_ms: i64) -> Self {
        Self {
            size_ms: size_ms.max(1),
        }
    }

    pub fn assign(&self, timestamp: Timestamp) -> Window {
        let start = timestamp - timestamp.rem_euclid(self.size_ms);
        Window::new(start, start + self.size_ms)
    }
}

/// Overlapping windows of `size_ms` starting every `period_ms`
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindows {
    size_ms: i64,
    period_ms: i64,
}

impl SlidingWindows {
    pub fn new(size_ms: i64, period_ms: i64) -> Self {
        Self {
            size_ms: size_ms.max(1),
            period_ms: period_ms.max(1),
        }
    }

    /// Every window containing the timestamp, earliest first
    pub fn assign(&self, timestamp: Timestamp) -> Vec<Window> {
        let last_start = timestamp - timestamp.rem_euclid(self.period_ms);
        let mut windows = Vec::new();
        let mut start = last_start;
        while start > timestamp - self.size_ms {
            windows.push(Window::new(start, start + self.size_ms));
            start -= self.period_ms;
        }
        windows.reverse();
        windows
    }
}
