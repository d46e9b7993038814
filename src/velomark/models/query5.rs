use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::TimestampedResult;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::nexmark::event::{AuctionCount, Event};
use crate::velomark::nexmark::generator::EventGenerator;
use std::collections::{BTreeMap, HashMap};

/// Per sliding window, every auction with the highest bid count
#[derive(Debug, Clone, Default)]
pub struct Query5Model;

impl QueryModel<AuctionCount> for Query5Model {
    fn name(&self) -> &str {
        "Query5Model"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<AuctionCount>> {
        config.validate()?;

        let size = config.window_size_ms();
        let period = config.window_period_ms();

        // window start -> auction -> bids
        let mut windows: BTreeMap<i64, HashMap<u64, u64>> = BTreeMap::new();
        for e in EventGenerator::new(config).events() {
            let bid = match e.event {
                Event::Bid(bid) => bid,
                _ => continue,
            };
            let first = (e.timestamp - size).div_euclid(period) + 1;
            let last = e.timestamp.div_euclid(period);
            for k in first..=last {
                *windows
                    .entry(k * period)
                    .or_default()
                    .entry(bid.auction)
                    .or_insert(0) += 1;
            }
        }

        let mut expected = Vec::new();
        for (start, counts) in windows {
            let top = counts.values().copied().max().unwrap_or(0);
            for (auction, count) in counts {
                if count == top {
                    expected.push(TimestampedResult::new(
                        AuctionCount { auction, count },
                        start + size - 1,
                    ));
                }
            }
        }

        Ok(Acceptance::multiset(
            format!("hottest auctions per {}ms window every {}ms", size, period),
            expected,
            self.tolerance(),
        ))
    }
}
