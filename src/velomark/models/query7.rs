use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::TimestampedResult;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::nexmark::event::{Bid, Event};
use crate::velomark::nexmark::generator::EventGenerator;
use std::collections::BTreeMap;

/// Per fixed window, every bid carrying the window's highest price
#[derive(Debug, Clone, Default)]
pub struct Query7Model;

impl QueryModel<Bid> for Query7Model {
    fn name(&self) -> &str {
        "Query7Model"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<Bid>> {
        config.validate()?;

        let size = config.window_size_ms();
        let mut windows: BTreeMap<i64, Vec<Bid>> = BTreeMap::new();
        for e in EventGenerator::new(config).events() {
            if let Event::Bid(bid) = e.event {
                windows
                    .entry(e.timestamp.div_euclid(size) * size)
                    .or_default()
                    .push(bid);
            }
        }

        let mut expected = Vec::new();
        for (start, bids) in windows {
            let top = bids.iter().map(|b| b.price).max().unwrap_or(0);
            expected.extend(
                bids.into_iter()
                    .filter(|b| b.price == top)
                    .map(|b| TimestampedResult::new(b, start + size - 1)),
            );
        }

        Ok(Acceptance::multiset(
            format!("highest bids per {}ms window", size),
            expected,
            self.tolerance(),
        ))
    }
}
