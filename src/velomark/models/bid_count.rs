use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::{format_timestamp, Timestamp};
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::harness::verdict::MismatchReport;
use crate::velomark::nexmark::event::{AuctionCount, Event};
use crate::velomark::nexmark::generator::EventGenerator;
use std::collections::BTreeMap;

/// Bid count per auction over the whole input
///
/// Accepts any output in which every auction with bids is reported exactly
/// once with its generated bid count, stamped with the time of its latest bid.
#[derive(Debug, Clone, Default)]
pub struct BidCountModel;

impl QueryModel<AuctionCount> for BidCountModel {
    fn name(&self) -> &str {
        "BidCountModel"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<AuctionCount>> {
        config.validate()?;

        // auction -> (bids, latest bid time)
        let mut bids: BTreeMap<u64, (u64, Timestamp)> = BTreeMap::new();
        for e in EventGenerator::new(config).events() {
            if let Event::Bid(bid) = e.event {
                let (count, latest) = bids.entry(bid.auction).or_insert((0, e.timestamp));
                *count += 1;
                *latest = (*latest).max(e.timestamp);
            }
        }

        let description = format!("bid counts for {} auctions", bids.len());
        let label = description.clone();
        Ok(Acceptance::new(
            description,
            self.tolerance(),
            move |observed| {
                let mut report =
                    MismatchReport::new(label.clone(), observed.len()).with_expected_count(bids.len());
                let mut seen: BTreeMap<u64, usize> = BTreeMap::new();

                for result in observed {
                    let AuctionCount { auction, count } = result.value;
                    *seen.entry(auction).or_insert(0) += 1;

                    if count == 0 {
                        report.record_unexpected(result);
                        report.note(format!("auction {} reported with zero bids", auction));
                        continue;
                    }
                    match bids.get(&auction) {
                        Some(&(generated, _)) if generated != count => {
                            report.record_unexpected(result);
                            report.note(format!(
                                "auction {} counted {} bids, generated {}",
                                auction, count, generated
                            ));
                        }
                        Some(&(_, latest)) if latest != result.timestamp => {
                            report.record_unexpected(result);
                            report.note(format!(
                                "auction {} stamped {}, latest bid at {}",
                                auction,
                                format_timestamp(result.timestamp),
                                format_timestamp(latest)
                            ));
                        }
                        Some(_) => {}
                        None => report.record_unexpected(result),
                    }
                }

                for (auction, times) in &seen {
                    if *times > 1 {
                        report.note(format!("auction {} reported {} times", auction, times));
                    }
                }
                for (auction, (count, _)) in &bids {
                    if !seen.contains_key(auction) {
                        report.record_missing(format!(
                            "{:?}",
                            AuctionCount {
                                auction: *auction,
                                count: *count
                            }
                        ));
                    }
                }

                if report.is_clean() {
                    Ok(())
                } else {
                    Err(report)
                }
            },
        ))
    }
}
