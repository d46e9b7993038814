use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::TimestampedResult;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::nexmark::event::{AuctionPrice, Event};
use crate::velomark::nexmark::generator::EventGenerator;

/// `(auction, price)` of every bid on an auction divisible by `auction_skip`
#[derive(Debug, Clone, Default)]
pub struct Query2Model;

impl QueryModel<AuctionPrice> for Query2Model {
    fn name(&self) -> &str {
        "Query2Model"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<AuctionPrice>> {
        config.validate()?;

        let skip = config.auction_skip;
        let expected: Vec<_> = EventGenerator::new(config)
            .events()
            .filter_map(|e| match e.event {
                Event::Bid(bid) if bid.auction % skip == 0 => Some(TimestampedResult::new(
                    AuctionPrice {
                        auction: bid.auction,
                        price: bid.price,
                    },
                    e.timestamp,
                )),
                _ => None,
            })
            .collect();

        Ok(Acceptance::multiset(
            format!("bids on every {}th auction", skip),
            expected,
            self.tolerance(),
        ))
    }
}
