//! Query3: local item suggestion
//!
//! Incremental join of people living in OR, ID or CA with the auctions they
//! sell in category 10. Both sides are retained, so a match is emitted as soon
//! as the second half arrives, whichever side that is. The result timestamp is
//! the later of the two event times.

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::{Emitter, QueryDefinition, QueryOperator};
use crate::velomark::error::{EngineResult, HarnessResult};
use crate::velomark::nexmark::event::{Auction, Event, NameCityStateId, Person, TimestampedEvent};
use std::collections::{HashMap, HashSet};

pub const LOCAL_STATES: &[&str] = &["OR", "ID", "CA"];
pub const LOCAL_CATEGORY: u64 = 10;

#[derive(Debug, Clone, Default)]
pub struct Query3;

impl QueryDefinition<NameCityStateId> for Query3 {
    fn name(&self) -> &str {
        "Query3"
    }

    fn instantiate(
        &self,
        _config: &NexmarkConfig,
    ) -> HarnessResult<Box<dyn QueryOperator<NameCityStateId>>> {
        Ok(Box::new(LocalItemJoin::default()))
    }
}

#[derive(Default)]
struct LocalItemJoin {
    /// Local sellers by person id
    sellers: HashMap<u64, Person>,
    /// Category auctions whose seller has not been seen yet, by seller id
    pending: HashMap<u64, Vec<Auction>>,
    /// People seen outside the local states; their auctions never match
    non_local: HashSet<u64>,
}

impl LocalItemJoin {
    fn emit_match(person: &Person, auction: &Auction, out: &mut Emitter<NameCityStateId>) {
        out.emit(
            NameCityStateId {
                name: person.name.clone(),
                city: person.city.clone(),
                state: person.state.clone(),
                id: auction.id,
            },
            person.date_time.max(auction.date_time),
        );
    }
}

impl QueryOperator<NameCityStateId> for LocalItemJoin {
    fn process_event(
        &mut self,
        event: TimestampedEvent,
        out: &mut Emitter<NameCityStateId>,
    ) -> EngineResult<()> {
        match event.event {
            Event::Person(person) if LOCAL_STATES.contains(&person.state.as_str()) => {
                if let Some(auctions) = self.pending.remove(&person.id) {
                    for auction in &auctions {
                        Self::emit_match(&person, auction, out);
                    }
                }
                self.sellers.insert(person.id, person);
            }
            Event::Person(person) => {
                self.pending.remove(&person.id);
                self.non_local.insert(person.id);
            }
            Event::Auction(auction) if auction.category == LOCAL_CATEGORY => {
                match self.sellers.get(&auction.seller) {
                    Some(person) => Self::emit_match(person, &auction, out),
                    None if self.non_local.contains(&auction.seller) => {}
                    None => self.pending.entry(auction.seller).or_default().push(auction),
                }
            }
            _ => {}
        }
        Ok(())
    }
}
