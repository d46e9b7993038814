//! Query1: currency conversion
//!
//! Converts every bid price from dollars to euros.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{Bid, Event, TimestampedEvent};

pub const DOLLAR_TO_EURO_NUMERATOR: u64 = 89;
pub const DOLLAR_TO_EURO_DENOMINATOR: u64 = 100;

#[derive(Debug, Clone, Default)]
pub struct Query1;

impl QueryDefinition<Bid> for Query1 {
    fn name(&self) -> &str {
        "Query1"
    }

    fn instantiate(&self, _config: &NexmarkConfig) -> HarnessResult<Box<dyn QueryOperator<Bid>>> {
        Ok(Box::new(CurrencyConversion))
    }
}

struct CurrencyConversion;

impl QueryOperator<Bid> for CurrencyConversion {
    fn process_event(&mut self, event: TimestampedEvent, out: &mut Emitter<Bid>) -> EngineResult<()> {
        if let Event::Bid(bid) = event.event {
            let price = bid.price * DOLLAR_TO_EURO_NUMERATOR / DOLLAR_TO_EURO_DENOMINATOR;
            out.emit(Bid { price, ..bid }, event.timestamp);
        }
        Ok(())
    }
}
