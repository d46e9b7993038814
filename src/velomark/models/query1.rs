use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::TimestampedResult;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::nexmark::event::{Bid, Event};
use crate::velomark::nexmark::generator::EventGenerator;

/// Every bid, price converted at 0.89 euro per dollar, at the bid's time
#[derive(Debug, Clone, Default)]
pub struct Query1Model;

impl QueryModel<Bid> for Query1Model {
    fn name(&self) -> &str {
        "Query1Model"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<Bid>> {
        config.validate()?;

        let expected: Vec<_> = EventGenerator::new(config)
            .events()
            .filter_map(|e| match e.event {
                Event::Bid(bid) => {
                    let euros = bid.price * 89 / 100;
                    Some(TimestampedResult::new(Bid { price: euros, ..bid }, e.timestamp))
                }
                _ => None,
            })
            .collect();

        Ok(Acceptance::multiset(
            "all bids converted to euros",
            expected,
            self.tolerance(),
        ))
    }
}
