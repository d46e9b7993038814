//! Query runner
//!
//! Runs one query against one source in one mode and returns everything the
//! query emitted. Batch runs wait for the job to finish; streaming runs wait
//! for quiescence because the source never closes. In both cases the job is
//! cancelled and released before the runner returns.

use super::context::{ExecutionContext, JobOutcome};
use super::operator::QueryDefinition;
use super::pipeline::{submit_pipeline, RunningQuery};
use super::types::{ExecutionMode, ResultValue, TimestampedResult};
use crate::velomark::config::NexmarkConfig;
use crate::velomark::error::{HarnessError, HarnessResult};
use crate::velomark::nexmark::source::EventSource;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct QueryRunner {
    context: Arc<dyn ExecutionContext>,
    timeout: Duration,
}

impl QueryRunner {
    pub fn new(context: Arc<dyn ExecutionContext>, timeout: Duration) -> Self {
        Self { context, timeout }
    }

    pub fn context(&self) -> &Arc<dyn ExecutionContext> {
        &self.context
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the query to completion (batch) or quiescence (streaming)
    pub async fn run<T: ResultValue>(
        &self,
        query: &dyn QueryDefinition<T>,
        source: &dyn EventSource,
        config: &NexmarkConfig,
        mode: ExecutionMode,
    ) -> HarnessResult<Vec<TimestampedResult<T>>> {
        let RunningQuery {
            mut handle,
            sink,
            query_name,
            ..
        } = submit_pipeline(self.context.as_ref(), query, source, config, mode)?;

        let started = Instant::now();
        let operation = match mode {
            ExecutionMode::Batch => "await_completion",
            ExecutionMode::Streaming => "await_quiescence",
        };

        let waited = {
            let context = self.context.as_ref();
            let handle = &mut handle;
            tokio::time::timeout(self.timeout, async move {
                match mode {
                    ExecutionMode::Batch => context.await_completion(handle).await,
                    ExecutionMode::Streaming => context.await_quiescence(handle).await,
                }
            })
            .await
        };

        self.context.cancel(handle).await;

        match waited {
            Ok(JobOutcome::Completed) | Ok(JobOutcome::Quiescent) => {
                let results = sink.take()?;
                log::debug!(
                    "'{}' ({}) produced {} results in {:?}",
                    query_name,
                    mode,
                    results.len(),
                    started.elapsed()
                );
                Ok(results)
            }
            Ok(JobOutcome::Failed(message)) => {
                log::error!("'{}' ({}) failed: {}", query_name, mode, message);
                Err(HarnessError::EngineFailure {
                    message,
                    query_name,
                    source: Some(self.context.name().to_string()),
                })
            }
            Ok(JobOutcome::Cancelled) => Err(HarnessError::EngineFailure {
                message: "job was cancelled before it finished".to_string(),
                query_name,
                source: Some(self.context.name().to_string()),
            }),
            Err(_) => {
                log::warn!(
                    "'{}' ({}) did not finish within {:?}",
                    query_name,
                    mode,
                    self.timeout
                );
                Err(HarnessError::Timeout {
                    message: format!("'{}' in {} mode", query_name, mode),
                    operation: operation.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

impl std::fmt::Debug for QueryRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRunner")
            .field("context", &self.context.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
