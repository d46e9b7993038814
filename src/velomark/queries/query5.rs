//! Query5: hot items
//!
//! Counts bids per auction over sliding windows and, when a window closes,
//! emits the auction(s) with the most bids in that window.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::engine::types::Timestamp;
use crate::velomark::engine::window::{SlidingWindows, Window};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{AuctionCount, Event, TimestampedEvent};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Query5;

impl QueryDefinition<AuctionCount> for Query5 {
    fn name(&self) -> &str {
        "Query5"
    }

    fn instantiate(
        &self,
        config: &NexmarkConfig,
    ) -> HarnessResult<Box<dyn QueryOperator<AuctionCount>>> {
        config.validate()?;
        Ok(Box::new(HotItems {
            windows: SlidingWindows::new(config.window_size_ms(), config.window_period_ms()),
            counts: BTreeMap::new(),
            watermark: None,
        }))
    }
}

struct HotItems {
    windows: SlidingWindows,
    /// Open windows, ordered by start (and therefore by end)
    counts: BTreeMap<Window, HashMap<u64, u64>>,
    watermark: Option<Timestamp>,
}

impl QueryOperator<AuctionCount> for HotItems {
    fn process_event(
        &mut self,
        event: TimestampedEvent,
        _out: &mut Emitter<AuctionCount>,
    ) -> EngineResult<()> {
        let bid = match event.event {
            Event::Bid(bid) => bid,
            _ => return Ok(()),
        };

        for window in self.windows.assign(event.timestamp) {
            if self.watermark.map_or(false, |wm| window.is_closed_by(wm)) {
                log::warn!("Query5 dropping bid for closed window {:?}", window);
                continue;
            }
            *self
                .counts
                .entry(window)
                .or_default()
                .entry(bid.auction)
                .or_insert(0) += 1;
        }
        Ok(())
    }

    fn advance_watermark(
        &mut self,
        watermark: Timestamp,
        out: &mut Emitter<AuctionCount>,
    ) -> EngineResult<()> {
        self.watermark = Some(watermark);

        while let Some(entry) = self.counts.first_entry() {
            if !entry.key().is_closed_by(watermark) {
                break;
            }
            let (window, counts) = entry.remove_entry();
            let max = match counts.values().copied().max() {
                Some(max) => max,
                None => continue,
            };

            let mut hottest: Vec<u64> = counts
                .into_iter()
                .filter(|(_, count)| *count == max)
                .map(|(auction, _)| auction)
                .collect();
            hottest.sort_unstable();

            for auction in hottest {
                out.emit(AuctionCount { auction, count: max }, window.max_timestamp());
            }
        }
        Ok(())
    }
}
