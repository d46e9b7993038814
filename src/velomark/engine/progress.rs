//! Job progress tracking
//!
//! A streaming job never finishes on its own, so the runner needs another way
//! to know the output is complete. The pipeline counts events fed into the
//! query and events that have exited its final stage, and records when the
//! final watermark has been processed. The job is quiescent once all expected
//! events have been fed, every fed event has exited, and the final watermark
//! is done.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
struct ProgressState {
    expected: u64,
    fed: AtomicU64,
    exited: AtomicU64,
    final_watermark: AtomicBool,
    quiescent: watch::Sender<bool>,
}

/// Shared, cloneable progress counters for one job
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    state: Arc<ProgressState>,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub expected: u64,
    pub fed: u64,
    pub exited: u64,
    pub final_watermark: bool,
}

impl ProgressTracker {
    pub fn new(expected: u64) -> Self {
        let (quiescent, _) = watch::channel(false);
        Self {
            state: Arc::new(ProgressState {
                expected,
                fed: AtomicU64::new(0),
                exited: AtomicU64::new(0),
                final_watermark: AtomicBool::new(false),
                quiescent,
            }),
        }
    }

    pub fn record_fed(&self) {
        self.state.fed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_exited(&self) {
        self.state.exited.fetch_add(1, Ordering::SeqCst);
        self.refresh();
    }

    pub fn record_final_watermark(&self) {
        self.state.final_watermark.store(true, Ordering::SeqCst);
        self.refresh();
    }

    pub fn is_quiescent(&self) -> bool {
        let fed = self.state.fed.load(Ordering::SeqCst);
        fed >= self.state.expected
            && self.state.exited.load(Ordering::SeqCst) == fed
            && self.state.final_watermark.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            expected: self.state.expected,
            fed: self.state.fed.load(Ordering::SeqCst),
            exited: self.state.exited.load(Ordering::SeqCst),
            final_watermark: self.state.final_watermark.load(Ordering::SeqCst),
        }
    }

    /// Resolve once the job is quiescent
    pub async fn wait_quiescent(&self) {
        let mut rx = self.state.quiescent.subscribe();
        loop {
            if *rx.borrow_and_update() || self.is_quiescent() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn refresh(&self) {
        if self.is_quiescent() {
            self.state.quiescent.send_replace(true);
        }
    }
}
