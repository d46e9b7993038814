//! Query7: highest bid
//!
//! For each fixed window, emits the bid(s) with the highest price.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::engine::types::Timestamp;
use crate::velomark::engine::window::{FixedWindows, Window};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{Bid, Event, TimestampedEvent};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Query7;

impl QueryDefinition<Bid> for Query7 {
    fn name(&self) -> &str {
        "Query7"
    }

    fn instantiate(&self, config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<Bid>>> {
        config.validate()?;
        Ok(Box::new(HighestBid {
            windows: FixedWindows::new(config.window_size_ms()),
            best: BTreeMap::new(),
            watermark: None,
        }))
    }
}

struct HighestBid {
    windows: FixedWindows,
    /// Highest price so far and the bids carrying it, per open window
    best: BTreeMap<Window, (u64, Vec<Bid>)>,
    watermark: Option<Timestamp>,
}

impl QueryOperator<Bid> for HighestBid {
    fn process_event(&mut self, event: TimestampedEvent, _out: &mut Emitter<Bid>) -> EngineResult<()> {
        let bid = match event.event {
            Event::Bid(bid) => bid,
            _ => return Ok(()),
        };

        let window = self.windows.assign(event.timestamp);
        if self.watermark.map_or(false, |wm| window.is_closed_by(wm)) {
            log::warn!("Query7 dropping bid for closed window {:?}", window);
            return Ok(());
        }

        let (price, bids) = self.best.entry(window).or_insert((bid.price, Vec::new()));
        if bid.price > *price {
            *price = bid.price;
            bids.clear();
        }
        if bid.price == *price {
            bids.push(bid);
        }
        Ok(())
    }

    fn advance_watermark(&mut self, watermark: Timestamp, out: &mut Emitter<Bid>) -> EngineResult<()> {
        self.watermark = Some(watermark);

        while let Some(entry) = self.best.first_entry() {
            if !entry.key().is_closed_by(watermark) {
                break;
            }
            let (window, (_, mut bids)) = entry.remove_entry();
            bids.sort();
            for bid in bids {
                out.emit(bid, window.max_timestamp());
            }
        }
        Ok(())
    }
}
