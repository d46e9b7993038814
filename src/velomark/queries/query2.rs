//! Query2: selection
//!
//! Emits `(auction, price)` for bids on every `auction_skip`-th auction.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{AuctionPrice, Event, TimestampedEvent};

#[derive(Debug, Clone, Default)]
pub struct Query2;

impl QueryDefinition<AuctionPrice> for Query2 {
    fn name(&self) -> &str {
        "Query2"
    }

    fn instantiate(
        &self,
        config: &NexmarkConfig,
    ) -> HarnessResult<Box<dyn QueryOperator<AuctionPrice>>> {
        config.validate()?;
        Ok(Box::new(Selection {
            auction_skip: config.auction_skip,
        }))
    }
}

struct Selection {
    auction_skip: u64,
}

impl QueryOperator<AuctionPrice> for Selection {
    fn process_event(
        &mut self,
        event: TimestampedEvent,
        out: &mut Emitter<AuctionPrice>,
    ) -> EngineResult<()> {
        match event.event {
            Event::Bid(bid) if bid.auction % self.auction_skip == 0 => {
                out.emit(
                    AuctionPrice {
                        auction: bid.auction,
                        price: bid.price,
                    },
                    event.timestamp,
                );
            }
            _ => {}
        }
        Ok(())
    }
}
