//! Watermark tracking for event-time processing
//!
//! Each source partition reports its own watermark. The pipeline-wide
//! watermark is the minimum across partitions and only becomes defined once
//! every partition has reported. Windowed operators close a window once the
//! pipeline watermark reaches the window end.

use super::types::{format_timestamp, Timestamp};

/// What to do with events that arrive behind the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateEventStrategy {
    /// Drop events that arrive after the watermark
    Drop,
    /// Process late events with a warning
    ProcessWithWarning,
    /// Process all late events silently
    ProcessAll,
}

impl Default for LateEventStrategy {
    fn default() -> Self {
        LateEventStrategy::ProcessWithWarning
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatermarkConfig {
    pub strategy: LateEventStrategy,
}

/// Snapshot of tracker counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkMetrics {
    pub current_watermark: Option<Timestamp>,
    pub late_events: u64,
    pub dropped_events: u64,
    pub partitions_reported: usize,
}

/// Merges per-partition watermarks
#[derive(Debug)]
pub struct WatermarkTracker {
    /// Latest watermark per partition, `None` until the partition reports
    partitions: Vec<Option<Timestamp>>,

    /// Minimum across partitions once all have reported
    current: Option<Timestamp>,

    config: WatermarkConfig,

    late_events: u64,
    dropped_events: u64,
}

impl WatermarkTracker {
    pub fn new(partitions: usize, config: WatermarkConfig) -> Self {
        Self {
            partitions: vec![None; partitions.max(1)],
            current: None,
            config,
            late_events: 0,
            dropped_events: 0,
        }
    }

    pub fn with_defaults(partitions: usize) -> Self {
        Self::new(partitions, WatermarkConfig::default())
    }

    /// Record a partition watermark
    ///
    /// Returns the new pipeline watermark if it advanced. Regressions and
    /// unknown partitions are ignored.
    pub fn update(&mut self, partition: usize, watermark: Timestamp) -> Option<Timestamp> {
        let slot = match self.partitions.get_mut(partition) {
            Some(slot) => slot,
            None => {
                log::warn!(
                    "Ignoring watermark from unknown partition {} ({} partitions)",
                    partition,
                    self.partitions.len()
                );
                return None;
            }
        };

        if slot.map_or(false, |previous| watermark <= previous) {
            return None;
        }
        *slot = Some(watermark);

        let merged = self
            .partitions
            .iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .and_then(|all| all.into_iter().min())?;

        if self.current.map_or(true, |current| merged > current) {
            self.current = Some(merged);
            Some(merged)
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<Timestamp> {
        self.current
    }

    /// Check if an event is behind the pipeline watermark
    ///
    /// Returns (is_late, should_drop)
    pub fn is_late(&mut self, event_time: Timestamp) -> (bool, bool) {
        let watermark = match self.current {
            Some(watermark) => watermark,
            None => return (false, false),
        };

        if event_time >= watermark {
            return (false, false);
        }

        self.late_events += 1;
        match self.config.strategy {
            LateEventStrategy::Drop => {
                self.dropped_events += 1;
                log::warn!(
                    "Dropping late event at {} (watermark {})",
                    format_timestamp(event_time),
                    format_timestamp(watermark)
                );
                (true, true)
            }
            LateEventStrategy::ProcessWithWarning => {
                log::warn!(
                    "Processing late event at {} (watermark {})",
                    format_timestamp(event_time),
                    format_timestamp(watermark)
                );
                (true, false)
            }
            LateEventStrategy::ProcessAll => (false, false),
        }
    }

    pub fn metrics(&self) -> WatermarkMetrics {
        WatermarkMetrics {
            current_watermark: self.current,
            late_events: self.late_events,
            dropped_events: self.dropped_events,
            partitions_reported: self.partitions.iter().filter(|p| p.is_some()).count(),
        }
    }
}
