//! Shared fixtures for harness tests
//!
//! Small configurations that keep runs fast, deliberately wrong queries the
//! harness must catch, and execution contexts that misbehave on purpose.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use velomark::velomark::config::{HarnessConfig, NexmarkConfig};
use velomark::velomark::engine::context::{
    ContextFactory, ExecutionContext, Job, JobHandle, JobOutcome,
};
use velomark::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use velomark::velomark::engine::runner::QueryRunner;
use velomark::velomark::engine::types::{ExecutionMode, ResultValue, Timestamp};
use velomark::velomark::error::{EngineError, EngineResult, HarnessResult};
use velomark::velomark::harness::scenario::{ScenarioCase, ScenarioOutcome};
use velomark::velomark::harness::verifier::Verifier;
use velomark::velomark::nexmark::event::{Bid, Event, TimestampedEvent};

/// Fast configuration: short windows and small reordering delays
pub fn test_config(events: u64, generators: usize) -> NexmarkConfig {
    NexmarkConfig {
        num_events: events,
        num_event_generators: generators,
        first_event_rate: 1_000,
        window_size_sec: 2,
        window_period_sec: 1,
        auction_skip: 7,
        prob_delayed_event: 0.1,
        occasional_delay_ms: 50,
        ..NexmarkConfig::default()
    }
}

pub fn harness_config(events: u64, generators: usize) -> HarnessConfig {
    HarnessConfig {
        nexmark: test_config(events, generators),
        timeout_ms: 30_000,
        max_parallel_scenarios: 4,
        ..HarnessConfig::default()
    }
}

// ============================================================================
// Mutated queries
// ============================================================================

/// Wraps a correct query and rewrites every value it emits
pub struct MutatedQuery<Q, F> {
    name: String,
    inner: Q,
    mutate: Arc<F>,
}

impl<Q, F> MutatedQuery<Q, F> {
    pub fn new(name: impl Into<String>, inner: Q, mutate: F) -> Self {
        Self {
            name: name.into(),
            inner,
            mutate: Arc::new(mutate),
        }
    }
}

impl<T, Q, F> QueryDefinition<T> for MutatedQuery<Q, F>
where
    T: ResultValue,
    Q: QueryDefinition<T>,
    F: Fn(T) -> T + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self, config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<T>>> {
        Ok(Box::new(MutatedOperator {
            inner: self.inner.instantiate(config)?,
            mutate: Arc::clone(&self.mutate),
            scratch: Emitter::new(),
        }))
    }
}

struct MutatedOperator<T, F> {
    inner: Box<dyn QueryOperator<T>>,
    mutate: Arc<F>,
    scratch: Emitter<T>,
}

impl<T, F> MutatedOperator<T, F>
where
    T: ResultValue,
    F: Fn(T) -> T + Send + Sync + 'static,
{
    fn forward(&mut self, out: &mut Emitter<T>) {
        for result in self.scratch.drain() {
            out.emit((self.mutate)(result.value), result.timestamp);
        }
    }
}

impl<T, F> QueryOperator<T> for MutatedOperator<T, F>
where
    T: ResultValue,
    F: Fn(T) -> T + Send + Sync + 'static,
{
    fn process_event(&mut self, event: TimestampedEvent, out: &mut Emitter<T>) -> EngineResult<()> {
        self.inner.process_event(event, &mut self.scratch)?;
        self.forward(out);
        Ok(())
    }

    fn advance_watermark(&mut self, watermark: Timestamp, out: &mut Emitter<T>) -> EngineResult<()> {
        self.inner.advance_watermark(watermark, &mut self.scratch)?;
        self.forward(out);
        Ok(())
    }
}

/// Wraps a correct query and stamps every result it emits at a fixed time
pub struct RestampedQuery<Q> {
    name: String,
    inner: Q,
    timestamp: Timestamp,
}

impl<Q> RestampedQuery<Q> {
    pub fn new(name: impl Into<String>, inner: Q, timestamp: Timestamp) -> Self {
        Self {
            name: name.into(),
            inner,
            timestamp,
        }
    }
}

impl<T, Q> QueryDefinition<T> for RestampedQuery<Q>
where
    T: ResultValue,
    Q: QueryDefinition<T>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self, config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<T>>> {
        Ok(Box::new(RestampedOperator {
            inner: self.inner.instantiate(config)?,
            timestamp: self.timestamp,
            scratch: Emitter::new(),
        }))
    }
}

struct RestampedOperator<T> {
    inner: Box<dyn QueryOperator<T>>,
    timestamp: Timestamp,
    scratch: Emitter<T>,
}

impl<T: ResultValue> RestampedOperator<T> {
    fn forward(&mut self, out: &mut Emitter<T>) {
        for result in self.scratch.drain() {
            out.emit(result.value, self.timestamp);
        }
    }
}

impl<T: ResultValue> QueryOperator<T> for RestampedOperator<T> {
    fn process_event(&mut self, event: TimestampedEvent, out: &mut Emitter<T>) -> EngineResult<()> {
        self.inner.process_event(event, &mut self.scratch)?;
        self.forward(out);
        Ok(())
    }

    fn advance_watermark(&mut self, watermark: Timestamp, out: &mut Emitter<T>) -> EngineResult<()> {
        self.inner.advance_watermark(watermark, &mut self.scratch)?;
        self.forward(out);
        Ok(())
    }
}

/// Query1 with the wrong exchange rate
pub struct WrongRateQuery1;

impl QueryDefinition<Bid> for WrongRateQuery1 {
    fn name(&self) -> &str {
        "WrongRateQuery1"
    }

    fn instantiate(&self, _config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<Bid>>> {
        Ok(Box::new(WrongRate))
    }
}

struct WrongRate;

impl QueryOperator<Bid> for WrongRate {
    fn process_event(&mut self, event: TimestampedEvent, out: &mut Emitter<Bid>) -> EngineResult<()> {
        if let Event::Bid(bid) = event.event {
            let price = bid.price * 90 / 100;
            out.emit(Bid { price, ..bid }, event.timestamp);
        }
        Ok(())
    }
}

// ============================================================================
// Failing queries
// ============================================================================

/// Returns an operator error once it has seen `fail_after` events
pub struct FailingQuery {
    pub fail_after: u64,
}

impl QueryDefinition<Bid> for FailingQuery {
    fn name(&self) -> &str {
        "FailingQuery"
    }

    fn instantiate(&self, _config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<Bid>>> {
        Ok(Box::new(FailingOperator {
            seen: 0,
            fail_after: self.fail_after,
        }))
    }
}

struct FailingOperator {
    seen: u64,
    fail_after: u64,
}

impl QueryOperator<Bid> for FailingOperator {
    fn process_event(&mut self, _event: TimestampedEvent, _out: &mut Emitter<Bid>) -> EngineResult<()> {
        self.seen += 1;
        if self.seen >= self.fail_after {
            return Err(EngineError::OperatorFailed {
                operator: "FailingQuery".to_string(),
                message: format!("refusing event {}", self.seen),
            });
        }
        Ok(())
    }
}

/// Panics on the first bid it sees
pub struct PanickingQuery;

impl QueryDefinition<Bid> for PanickingQuery {
    fn name(&self) -> &str {
        "PanickingQuery"
    }

    fn instantiate(&self, _config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<Bid>>> {
        Ok(Box::new(PanickingOperator))
    }
}

struct PanickingOperator;

impl QueryOperator<Bid> for PanickingOperator {
    fn process_event(&mut self, event: TimestampedEvent, _out: &mut Emitter<Bid>) -> EngineResult<()> {
        if let Event::Bid(bid) = event.event {
            panic!("operator cannot handle bid on auction {}", bid.auction);
        }
        Ok(())
    }
}

// ============================================================================
// Misbehaving execution contexts
// ============================================================================

/// Accepts jobs but never polls them
#[derive(Default)]
pub struct StalledExecutionContext {
    parked: Mutex<HashMap<Uuid, BoxFuture<'static, EngineResult<()>>>>,
}

#[async_trait]
impl ExecutionContext for StalledExecutionContext {
    fn name(&self) -> &str {
        "stalled"
    }

    fn submit(&self, job: Job) -> HarnessResult<JobHandle> {
        let handle = JobHandle::detached(job.name, job.progress);
        self.parked.lock().unwrap().insert(handle.id(), job.future);
        Ok(handle)
    }

    async fn await_completion(&self, _handle: &mut JobHandle) -> JobOutcome {
        futures::future::pending().await
    }

    async fn cancel(&self, handle: JobHandle) {
        self.parked.lock().unwrap().remove(&handle.id());
    }

    fn active_jobs(&self) -> usize {
        self.parked.lock().unwrap().len()
    }
}

/// Hands out stalled contexts and counts how many it created
#[derive(Default)]
pub struct StalledContextFactory {
    pub created: AtomicU64,
}

impl ContextFactory for StalledContextFactory {
    fn create(&self, _scenario: &str) -> Arc<dyn ExecutionContext> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(StalledExecutionContext::default())
    }
}

/// A scenario case whose execution panics outright
pub struct PanickingCase;

#[async_trait]
impl ScenarioCase for PanickingCase {
    fn query_name(&self) -> &str {
        "PanickingCase"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    async fn execute(
        &self,
        _runner: &QueryRunner,
        _config: &NexmarkConfig,
        mode: ExecutionMode,
        _verifier: &Verifier,
    ) -> ScenarioOutcome {
        panic!("scenario setup exploded in {} mode", mode)
    }
}
