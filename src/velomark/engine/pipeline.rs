//! Pipeline composition
//!
//! [`submit_pipeline`] wires a source feed into a fresh query operator and
//! submits the resulting job to an execution context. The job feeds every
//! event through the operator, merges partition watermarks, and pushes all
//! operator output into a [`ResultSink`] the caller keeps.

use super::capture::ResultSink;
use super::context::{ExecutionContext, Job, JobHandle};
use super::operator::{Emitter, QueryDefinition, QueryOperator};
use super::progress::ProgressTracker;
use super::types::{format_timestamp, ExecutionMode, ResultValue, MAX_WATERMARK};
use super::watermark::WatermarkTracker;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::source::{EventFeed, EventSource, SourceMessage};
use futures::{FutureExt, StreamExt};

/// A submitted query and the sink its results land in
#[derive(Debug)]
pub struct RunningQuery<T> {
    pub handle: JobHandle,
    pub sink: ResultSink<T>,
    pub mode: ExecutionMode,
    pub query_name: String,
}

/// Instantiate the query, open the source and submit the job
pub fn submit_pipeline<T: ResultValue>(
    context: &dyn ExecutionContext,
    query: &dyn QueryDefinition<T>,
    source: &dyn EventSource,
    config: &NexmarkConfig,
    mode: ExecutionMode,
) -> HarnessResult<RunningQuery<T>> {
    config.validate()?;

    let query_name = query.name().to_string();
    let operator = query.instantiate(config)?;
    let feed = source.open(config, mode)?;

    log::debug!(
        "Submitting '{}' on '{}' source ({} mode, {} partitions, {} events)",
        query_name,
        source.name(),
        mode,
        feed.partitions,
        feed.expected_events
    );

    let progress = ProgressTracker::new(feed.expected_events);
    let sink = ResultSink::new();
    let future = drive(
        query_name.clone(),
        operator,
        feed,
        progress.clone(),
        sink.clone(),
    )
    .boxed();

    let handle = context.submit(Job {
        name: format!("{}/{}", query_name, mode),
        progress,
        future,
    })?;

    Ok(RunningQuery {
        handle,
        sink,
        mode,
        query_name,
    })
}

async fn drive<T: ResultValue>(
    query_name: String,
    mut operator: Box<dyn QueryOperator<T>>,
    feed: EventFeed,
    progress: ProgressTracker,
    sink: ResultSink<T>,
) -> EngineResult<()> {
    let EventFeed {
        mut stream,
        partitions,
        ..
    } = feed;
    let mut watermarks = WatermarkTracker::with_defaults(partitions);
    let mut out = Emitter::new();

    while let Some(message) = stream.next().await {
        match message {
            SourceMessage::Event(event) => {
                progress.record_fed();
                let (_, should_drop) = watermarks.is_late(event.timestamp);
                if !should_drop {
                    operator.process_event(event, &mut out)?;
                    sink.extend(out.drain())?;
                }
                progress.record_exited();
            }
            SourceMessage::Watermark {
                partition,
                watermark,
            } => {
                if let Some(global) = watermarks.update(partition, watermark) {
                    operator.advance_watermark(global, &mut out)?;
                    sink.extend(out.drain())?;
                    if global == MAX_WATERMARK {
                        progress.record_final_watermark();
                        log::debug!(
                            "'{}' processed final watermark ({} results)",
                            query_name,
                            sink.len()
                        );
                    } else {
                        log::trace!("'{}' watermark at {}", query_name, format_timestamp(global));
                    }
                }
            }
        }
    }

    let metrics = watermarks.metrics();
    log::debug!(
        "'{}' input drained: {:?}, late events {}",
        query_name,
        progress.snapshot(),
        metrics.late_events
    );
    Ok(())
}
