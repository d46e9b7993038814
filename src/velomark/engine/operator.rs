//! Query operator traits
//!
//! A [`QueryDefinition`] is the static description of a query; each run
//! instantiates a fresh [`QueryOperator`] holding the query's state. Operators
//! see the same calls in batch and streaming mode: one `process_event` per
//! delivered event and one `advance_watermark` per pipeline watermark advance.

use super::types::{ResultValue, Timestamp, TimestampedResult};
use crate::velomark::config::NexmarkConfig;
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::TimestampedEvent;

/// Collects operator output between pipeline steps
#[derive(Debug)]
pub struct Emitter<T> {
    buffer: Vec<TimestampedResult<T>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, value: T, timestamp: Timestamp) {
        self.buffer.push(TimestampedResult::new(value, timestamp));
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take everything emitted since the last drain
    pub fn drain(&mut self) -> Vec<TimestampedResult<T>> {
        std::mem::take(&mut self.buffer)
    }
}

/// Running state of one query instance
pub trait QueryOperator<T: ResultValue>: Send {
    fn process_event(&mut self, event: TimestampedEvent, out: &mut Emitter<T>) -> EngineResult<()>;

    /// Called when the pipeline watermark advances; `MAX_WATERMARK` means end of input
    fn advance_watermark(&mut self, _watermark: Timestamp, _out: &mut Emitter<T>) -> EngineResult<()> {
        Ok(())
    }
}

/// A query that can be instantiated per run
pub trait QueryDefinition<T: ResultValue>: Send + Sync {
    fn name(&self) -> &str;

    fn instantiate(&self, config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<T>>>;
}
