//! Event sources for batch and streaming execution
//!
//! A source turns a configuration into an [`EventFeed`]: a stream of events
//! interleaved with per-partition watermarks.
//!
//! - **Batch**: one partition, the full sequence materialized up front and
//!   delivered in event-number order, followed by the final watermark. The
//!   feed then ends.
//! - **Streaming**: one partition per generator worker. Workers run
//!   concurrently, pace themselves, and occasionally hold an event back for
//!   `occasional_delay_ms` of logical time. A worker's watermark never passes
//!   its oldest undelivered event. After the event cap is reached every worker
//!   reports the final watermark, but the feed itself never ends.

use super::event::{KnownSize, TimestampedEvent};
use super::generator::EventGenerator;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::{ExecutionMode, Timestamp, MAX_WATERMARK};
use crate::velomark::error::HarnessResult;
use futures::stream::{self, BoxStream, StreamExt};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// One item delivered by a feed
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMessage {
    Event(TimestampedEvent),
    /// No further event from `partition` will carry a timestamp below `watermark`
    Watermark {
        partition: usize,
        watermark: Timestamp,
    },
}

/// An opened source
pub struct EventFeed {
    pub stream: BoxStream<'static, SourceMessage>,
    /// Number of independent partitions reporting watermarks
    pub partitions: usize,
    /// Events the feed will deliver before going idle
    pub expected_events: u64,
    pub mode: ExecutionMode,
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("partitions", &self.partitions)
            .field("expected_events", &self.expected_events)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Produces event feeds for a configuration
pub trait EventSource: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, config: &NexmarkConfig, mode: ExecutionMode) -> HarnessResult<EventFeed>;
}

/// The synthetic Nexmark auction source
#[derive(Debug, Clone, Default)]
pub struct NexmarkSource;

impl NexmarkSource {
    pub fn new() -> Self {
        Self
    }

    /// Materialize the whole sequence, generating worker ranges in parallel
    pub fn materialize(config: &NexmarkConfig) -> HarnessResult<Vec<TimestampedEvent>> {
        config.validate()?;
        let generator = EventGenerator::new(config);
        let ranges = generator.split(config.num_event_generators);

        let chunks: Vec<Vec<TimestampedEvent>> = ranges
            .into_par_iter()
            .map(|range| generator.events_in(range).collect::<Vec<_>>())
            .collect();

        Ok(chunks.into_iter().flatten().collect())
    }

    fn open_batch(&self, config: &NexmarkConfig) -> HarnessResult<EventFeed> {
        let events = Self::materialize(config)?;
        let expected_events = events.len() as u64;

        let bytes: usize = events.iter().map(|e| e.event.size_in_bytes()).sum();
        log::debug!(
            "Batch source materialized {} events ({} bytes)",
            expected_events,
            bytes
        );

        let stream = stream::iter(events.into_iter().map(SourceMessage::Event))
            .chain(stream::once(async {
                SourceMessage::Watermark {
                    partition: 0,
                    watermark: MAX_WATERMARK,
                }
            }))
            .boxed();

        Ok(EventFeed {
            stream,
            partitions: 1,
            expected_events,
            mode: ExecutionMode::Batch,
        })
    }

    fn open_streaming(&self, config: &NexmarkConfig) -> HarnessResult<EventFeed> {
        config.validate()?;
        let generator = Arc::new(EventGenerator::new(config));
        let ranges = generator.split(config.num_event_generators);
        let partitions = ranges.len();

        log::debug!(
            "Streaming source starting {} workers for {} events",
            partitions,
            config.num_events
        );

        let workers = ranges.into_iter().enumerate().map(|(partition, range)| {
            let worker = GeneratorWorker::new(partition, range, Arc::clone(&generator));
            stream::unfold(worker, |mut worker| async move {
                worker.next_message().await.map(|message| (message, worker))
            })
            .boxed()
        });

        // The source is unbounded: once every worker is exhausted it stays open
        let stream = stream::select_all(workers)
            .chain(stream::pending())
            .boxed();

        Ok(EventFeed {
            stream,
            partitions,
            expected_events: config.num_events,
            mode: ExecutionMode::Streaming,
        })
    }
}

impl EventSource for NexmarkSource {
    fn name(&self) -> &str {
        "nexmark"
    }

    fn open(&self, config: &NexmarkConfig, mode: ExecutionMode) -> HarnessResult<EventFeed> {
        match mode {
            ExecutionMode::Batch => self.open_batch(config),
            ExecutionMode::Streaming => self.open_streaming(config),
        }
    }
}

/// A held-back event ordered by its timestamp
#[derive(Debug)]
struct HeldEvent(TimestampedEvent);

impl PartialEq for HeldEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HeldEvent {}

impl PartialOrd for HeldEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeldEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl HeldEvent {
    fn key(&self) -> (Timestamp, u64) {
        (self.0.timestamp, self.0.event_number)
    }
}

/// Paced generator for one partition of the streaming source
struct GeneratorWorker {
    partition: usize,
    range: Range<u64>,
    next: u64,
    generator: Arc<EventGenerator>,
    held: BinaryHeap<Reverse<HeldEvent>>,
    outbox: VecDeque<SourceMessage>,
    last_watermark: Option<Timestamp>,
    emitted_since_pause: u64,
    finished: bool,
}

impl GeneratorWorker {
    fn new(partition: usize, range: Range<u64>, generator: Arc<EventGenerator>) -> Self {
        Self {
            partition,
            next: range.start,
            range,
            generator,
            held: BinaryHeap::new(),
            outbox: VecDeque::new(),
            last_watermark: None,
            emitted_since_pause: 0,
            finished: false,
        }
    }

    async fn next_message(&mut self) -> Option<SourceMessage> {
        loop {
            if let Some(message) = self.outbox.pop_front() {
                return Some(message);
            }
            if self.finished {
                return None;
            }
            self.step().await;
        }
    }

    /// Generate one event (or drain at the end) and queue what becomes deliverable
    async fn step(&mut self) {
        if self.next >= self.range.end {
            while let Some(Reverse(HeldEvent(event))) = self.held.pop() {
                self.outbox.push_back(SourceMessage::Event(event));
            }
            self.outbox.push_back(SourceMessage::Watermark {
                partition: self.partition,
                watermark: MAX_WATERMARK,
            });
            self.finished = true;
            log::debug!("Generator worker {} exhausted", self.partition);
            return;
        }

        self.pace().await;

        let event = self.generator.event_at(self.next);
        self.next += 1;
        let now = event.timestamp;
        let delay = self.generator.config().occasional_delay_ms;

        if self.generator.is_delayed(event.event_number) {
            self.held.push(Reverse(HeldEvent(event)));
        } else {
            self.outbox.push_back(SourceMessage::Event(event));
        }

        while let Some(Reverse(HeldEvent(oldest))) = self.held.peek() {
            if oldest.timestamp.saturating_add(delay) > now {
                break;
            }
            if let Some(Reverse(HeldEvent(ready))) = self.held.pop() {
                self.outbox.push_back(SourceMessage::Event(ready));
            }
        }

        self.queue_watermark();
    }

    /// Oldest pending timestamp minus holdback
    fn queue_watermark(&mut self) {
        let config = self.generator.config();
        let mut pending = if self.next < self.range.end {
            config.timestamp_for_event(self.next)
        } else {
            MAX_WATERMARK
        };
        if let Some(Reverse(HeldEvent(oldest))) = self.held.peek() {
            pending = pending.min(oldest.timestamp);
        }
        if pending == MAX_WATERMARK {
            // Reported once the held events are flushed
            return;
        }

        let watermark = pending.saturating_sub(config.watermark_holdback_ms);
        if self.last_watermark.map_or(true, |last| watermark > last) {
            self.last_watermark = Some(watermark);
            self.outbox.push_back(SourceMessage::Watermark {
                partition: self.partition,
                watermark,
            });
        }
    }

    async fn pace(&mut self) {
        let config = self.generator.config();
        if config.stream_pacing_batch == 0 {
            return;
        }
        self.emitted_since_pause += 1;
        if self.emitted_since_pause >= config.stream_pacing_batch {
            self.emitted_since_pause = 0;
            if config.stream_pacing_us > 0 {
                tokio::time::sleep(Duration::from_micros(config.stream_pacing_us)).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }
}
