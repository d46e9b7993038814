//! In-memory execution engine
//!
//! Provides the runtime side of the harness: execution contexts that run
//! jobs, the operator traits queries implement, windowing and watermark
//! helpers, and the [`runner::QueryRunner`] that ties a query and a source
//! together for one execution mode.

pub mod capture;
pub mod context;
pub mod operator;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod types;
pub mod watermark;
pub mod window;

pub use capture::ResultSink;
pub use context::{
    ContextFactory, ExecutionContext, Job, JobHandle, JobOutcome, TokioContextFactory,
    TokioExecutionContext,
};
pub use operator::{Emitter, QueryDefinition, QueryOperator};
pub use pipeline::{submit_pipeline, RunningQuery};
pub use progress::ProgressTracker;
pub use runner::QueryRunner;
pub use types::{ExecutionMode, ResultValue, Timestamp, TimestampedResult, MAX_WATERMARK};
pub use window::{FixedWindows, SlidingWindows, Window};
