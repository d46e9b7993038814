//! Core value types shared by sources, operators and the harness

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Logical time in epoch milliseconds
pub type Timestamp = i64;

/// Watermark signalling that no further input will arrive
pub const MAX_WATERMARK: Timestamp = i64::MAX;

/// How a query is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Finite, fully materialized input, no pacing
    Batch,
    /// Paced, unbounded input with watermarks and bounded reordering
    Streaming,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 2] = [ExecutionMode::Batch, ExecutionMode::Streaming];
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Batch => write!(f, "batch"),
            ExecutionMode::Streaming => write!(f, "streaming"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batch" => Ok(ExecutionMode::Batch),
            "streaming" | "stream" => Ok(ExecutionMode::Streaming),
            _ => Err(format!("Unknown execution mode: {}", s)),
        }
    }
}

/// Values a query can emit and a model can reason about
pub trait ResultValue: Clone + fmt::Debug + Eq + Hash + Ord + Send + Sync + 'static {}

impl<T> ResultValue for T where T: Clone + fmt::Debug + Eq + Hash + Ord + Send + Sync + 'static {}

/// A query output paired with its logical timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampedResult<T> {
    pub value: T,
    pub timestamp: Timestamp,
}

impl<T> TimestampedResult<T> {
    pub fn new(value: T, timestamp: Timestamp) -> Self {
        Self { value, timestamp }
    }
}

impl<T: fmt::Debug> fmt::Display for TimestampedResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.value, format_timestamp(self.timestamp))
    }
}

/// RFC 3339 with milliseconds, or the raw number when out of range
pub fn format_timestamp(timestamp: Timestamp) -> String {
    if timestamp == MAX_WATERMARK {
        return "+inf".to_string();
    }
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp.to_string())
}
