use super::QueryModel;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::TimestampedResult;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};
use crate::velomark::nexmark::event::{Event, NameCityStateId, Person};
use crate::velomark::nexmark::generator::EventGenerator;
use std::collections::HashMap;

/// Sellers in Oregon, Idaho or California joined with their category 10 auctions
///
/// A match is stamped with the later of the person and auction timestamps.
#[derive(Debug, Clone, Default)]
pub struct Query3Model;

impl QueryModel<NameCityStateId> for Query3Model {
    fn name(&self) -> &str {
        "Query3Model"
    }

    fn tolerance(&self) -> TimestampTolerance {
        TimestampTolerance::Exact
    }

    fn expected_results(
        &self,
        config: &NexmarkConfig,
    ) -> HarnessResult<Acceptance<NameCityStateId>> {
        config.validate()?;

        let mut people: HashMap<u64, Person> = HashMap::new();
        let mut auctions = Vec::new();
        for e in EventGenerator::new(config).events() {
            match e.event {
                Event::Person(p) if matches!(p.state.as_str(), "OR" | "ID" | "CA") => {
                    people.insert(p.id, p);
                }
                Event::Auction(a) if a.category == 10 => auctions.push(a),
                _ => {}
            }
        }

        let expected: Vec<_> = auctions
            .iter()
            .filter_map(|a| {
                people.get(&a.seller).map(|p| {
                    TimestampedResult::new(
                        NameCityStateId {
                            name: p.name.clone(),
                            city: p.city.clone(),
                            state: p.state.clone(),
                            id: a.id,
                        },
                        p.date_time.max(a.date_time),
                    )
                })
            })
            .collect();

        Ok(Acceptance::multiset(
            "local sellers of category 10 auctions",
            expected,
            self.tolerance(),
        ))
    }
}
