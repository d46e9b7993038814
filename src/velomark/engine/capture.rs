//! In-memory result capture

use super::types::TimestampedResult;
use crate::velomark::error::{EngineError, EngineResult, HarnessError, HarnessResult};
use std::sync::{Arc, Mutex};

/// Collects everything a query emits, shared between the job and the runner
#[derive(Debug)]
pub struct ResultSink<T> {
    results: Arc<Mutex<Vec<TimestampedResult<T>>>>,
}

impl<T> Clone for ResultSink<T> {
    fn clone(&self) -> Self {
        Self {
            results: Arc::clone(&self.results),
        }
    }
}

impl<T> Default for ResultSink<T> {
    fn default() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> ResultSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, batch: Vec<TimestampedResult<T>>) -> EngineResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut results = self
            .results
            .lock()
            .map_err(|e| EngineError::SinkPoisoned(e.to_string()))?;
        results.extend(batch);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.results.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the captured results, leaving the sink empty
    pub fn take(&self) -> HarnessResult<Vec<TimestampedResult<T>>> {
        let mut results = self
            .results
            .lock()
            .map_err(|e| HarnessError::EngineFailure {
                message: "result sink poisoned".to_string(),
                query_name: "sink".to_string(),
                source: Some(e.to_string()),
            })?;
        Ok(std::mem::take(&mut *results))
    }
}
