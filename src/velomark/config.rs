//! Harness and generator configuration
//!
//! [`NexmarkConfig`] is the single source of truth shared by the event source
//! and the reference models. [`HarnessConfig`] wraps it with the suite-level
//! settings (timeouts, parallelism, known-broken handling).
//!
//! Both load from YAML:
//!
//! ```yaml
//! timeout_ms: 120000
//! max_parallel_scenarios: 4
//! nexmark:
//!   num_events: 5000
//!   num_event_generators: 1
//! ```

use super::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 2015-07-15T00:00:00Z in epoch milliseconds
pub const BASE_TIME_MS: i64 = 1_436_918_400_000;

/// Upper bound on reordering delay and watermark holdback (one day)
pub const MAX_EVENT_DELAY_MS: i64 = 86_400_000;

/// Default bound on a single scenario run, sized for the default workload in streaming mode
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Event generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexmarkConfig {
    /// Number of events to generate (caps the unbounded streaming source)
    pub num_events: u64,

    /// Number of generator workers; also scales the inter-event delay
    pub num_event_generators: usize,

    /// Events per second produced by a single generator
    pub first_event_rate: u64,

    /// Logical time of event zero
    pub base_time_ms: i64,

    /// Seed mixed into every event's random stream
    pub seed: u64,

    /// Query2 selects auctions whose id is a multiple of this
    pub auction_skip: u64,

    /// Window size for Query5 and Query7
    pub window_size_sec: u64,

    /// Sliding window period for Query5
    pub window_period_sec: u64,

    /// Subtracted from every source watermark
    pub watermark_holdback_ms: i64,

    pub num_in_flight_auctions: u64,
    pub num_active_people: u64,
    pub hot_auction_ratio: u64,
    pub hot_sellers_ratio: u64,
    pub hot_bidders_ratio: u64,

    /// Probability that a streaming worker holds an event back
    pub prob_delayed_event: f64,

    /// Logical time a held-back event waits before delivery
    pub occasional_delay_ms: i64,

    /// Events emitted between pacing pauses in streaming mode
    pub stream_pacing_batch: u64,

    /// Length of each streaming pacing pause in microseconds
    pub stream_pacing_us: u64,
}

impl Default for NexmarkConfig {
    fn default() -> Self {
        Self {
            num_events: 100_000,
            num_event_generators: 100,
            first_event_rate: 10_000,
            base_time_ms: BASE_TIME_MS,
            seed: 0,
            auction_skip: 123,
            window_size_sec: 10,
            window_period_sec: 5,
            watermark_holdback_ms: 0,
            num_in_flight_auctions: 100,
            num_active_people: 1000,
            hot_auction_ratio: 2,
            hot_sellers_ratio: 4,
            hot_bidders_ratio: 4,
            prob_delayed_event: 0.1,
            occasional_delay_ms: 3_000,
            stream_pacing_batch: 500,
            stream_pacing_us: 200,
        }
    }
}

impl NexmarkConfig {
    /// Set the number of events
    pub fn with_events(mut self, num_events: u64) -> Self {
        self.num_events = num_events;
        self
    }

    /// Set the number of generator workers
    pub fn with_generators(mut self, num_event_generators: usize) -> Self {
        self.num_event_generators = num_event_generators;
        self
    }

    /// Set the generation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject configurations that would make a run meaningless
    pub fn validate(&self) -> HarnessResult<()> {
        if self.num_events == 0 {
            return Err(HarnessError::invalid_config(
                "num_events",
                "at least one event must be requested",
            ));
        }
        if self.num_event_generators == 0 {
            return Err(HarnessError::invalid_config(
                "num_event_generators",
                "at least one generator is required",
            ));
        }
        if self.first_event_rate == 0 {
            return Err(HarnessError::invalid_config(
                "first_event_rate",
                "event rate must be greater than zero",
            ));
        }
        if self.auction_skip == 0 {
            return Err(HarnessError::invalid_config(
                "auction_skip",
                "auction skip must be greater than zero",
            ));
        }
        if self.window_size_sec == 0 {
            return Err(HarnessError::invalid_config(
                "window_size_sec",
                "window size must be greater than zero",
            ));
        }
        if self.window_period_sec == 0 || self.window_period_sec > self.window_size_sec {
            return Err(HarnessError::invalid_config(
                "window_period_sec",
                format!(
                    "window period must be in 1..={} seconds, got {}",
                    self.window_size_sec, self.window_period_sec
                ),
            ));
        }
        for (field, ratio) in [
            ("hot_auction_ratio", self.hot_auction_ratio),
            ("hot_sellers_ratio", self.hot_sellers_ratio),
            ("hot_bidders_ratio", self.hot_bidders_ratio),
        ] {
            if ratio == 0 {
                return Err(HarnessError::invalid_config(
                    field,
                    "ratio must be at least 1",
                ));
            }
        }
        if self.num_active_people == 0 {
            return Err(HarnessError::invalid_config(
                "num_active_people",
                "at least one active person is required",
            ));
        }
        if !(0.0..=1.0).contains(&self.prob_delayed_event) {
            return Err(HarnessError::invalid_config(
                "prob_delayed_event",
                format!("probability must be within [0, 1], got {}", self.prob_delayed_event),
            ));
        }
        for (field, value) in [
            ("occasional_delay_ms", self.occasional_delay_ms),
            ("watermark_holdback_ms", self.watermark_holdback_ms),
        ] {
            if !(0..=MAX_EVENT_DELAY_MS).contains(&value) {
                return Err(HarnessError::invalid_config(
                    field,
                    format!("must be within 0..={} ms, got {}", MAX_EVENT_DELAY_MS, value),
                ));
            }
        }
        Ok(())
    }

    /// Microseconds between consecutive event numbers
    pub fn inter_event_delay_us(&self) -> f64 {
        1_000_000.0 / self.first_event_rate as f64 * self.num_event_generators as f64
    }

    /// Logical timestamp of an event number
    pub fn timestamp_for_event(&self, event_number: u64) -> i64 {
        self.base_time_ms + (self.inter_event_delay_us() * event_number as f64 / 1000.0) as i64
    }

    pub fn window_size_ms(&self) -> i64 {
        self.window_size_sec as i64 * 1000
    }

    pub fn window_period_ms(&self) -> i64 {
        self.window_period_sec as i64 * 1000
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str, file_name: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| HarnessError::ConfigParseError {
            message: e.to_string(),
            file: file_name.to_string(),
        })
    }
}

/// Suite-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Generator configuration shared by every scenario
    pub nexmark: NexmarkConfig,

    /// Bound on a single scenario run
    pub timeout_ms: u64,

    /// Scenarios executed concurrently
    pub max_parallel_scenarios: usize,

    /// Also run scenarios marked known-broken
    pub include_known_broken: bool,

    /// Missing/unexpected entries kept in a mismatch report
    pub mismatch_sample_limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            nexmark: NexmarkConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_parallel_scenarios: 4,
            include_known_broken: false,
            mismatch_sample_limit: 10,
        }
    }
}

impl HarnessConfig {
    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::IoError {
            message: e.to_string(),
            path: path.display().to_string(),
        })?;

        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str, file_name: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| HarnessError::ConfigParseError {
            message: e.to_string(),
            file: file_name.to_string(),
        })
    }

    pub fn validate(&self) -> HarnessResult<()> {
        self.nexmark.validate()?;
        if self.timeout_ms == 0 {
            return Err(HarnessError::invalid_config(
                "timeout_ms",
                "timeout must be greater than zero",
            ));
        }
        if self.max_parallel_scenarios == 0 {
            return Err(HarnessError::invalid_config(
                "max_parallel_scenarios",
                "at least one scenario must be allowed to run",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
