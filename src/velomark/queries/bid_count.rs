//! Bid count per auction
//!
//! Global aggregation over the whole input. Counts are flushed once, when the
//! final watermark arrives; each result carries the timestamp of the latest
//! bid seen for its auction.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::engine::types::{Timestamp, MAX_WATERMARK};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{AuctionCount, TimestampedEvent};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct BidCountPerAuction;

impl QueryDefinition<AuctionCount> for BidCountPerAuction {
    fn name(&self) -> &str {
        "BidCountPerAuction"
    }

    fn instantiate(
        &self,
        _config: &NexmarkConfig,
    ) -> HarnessResult<Box<dyn QueryOperator<AuctionCount>>> {
        Ok(Box::new(BidCounter::default()))
    }
}

#[derive(Default)]
struct BidCounter {
    /// auction -> (bids, latest bid time)
    counts: BTreeMap<u64, (u64, Timestamp)>,
    flushed: bool,
}

impl QueryOperator<AuctionCount> for BidCounter {
    fn process_event(
        &mut self,
        event: TimestampedEvent,
        _out: &mut Emitter<AuctionCount>,
    ) -> EngineResult<()> {
        if let Some(bid) = event.event.as_bid() {
            if self.flushed {
                log::warn!("Bid for auction {} after final flush ignored", bid.auction);
                return Ok(());
            }
            let (count, latest) = self
                .counts
                .entry(bid.auction)
                .or_insert((0, event.timestamp));
            *count += 1;
            *latest = (*latest).max(event.timestamp);
        }
        Ok(())
    }

    fn advance_watermark(
        &mut self,
        watermark: Timestamp,
        out: &mut Emitter<AuctionCount>,
    ) -> EngineResult<()> {
        if watermark != MAX_WATERMARK || self.flushed {
            return Ok(());
        }
        self.flushed = true;
        for (auction, (count, latest)) in std::mem::take(&mut self.counts) {
            out.emit(AuctionCount { auction, count }, latest);
        }
        Ok(())
    }
}
