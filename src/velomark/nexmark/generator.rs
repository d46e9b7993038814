//! Deterministic Nexmark event generator
//!
//! Every event is a pure function of its event number and the configuration:
//! the kind follows a fixed 1:3:46 person/auction/bid proportion, ids are
//! derived from the event number, and the remaining fields are drawn from a
//! random stream seeded by `(seed, event_number)`. Splitting the number range
//! across workers therefore changes delivery order only, never content.

use super::event::{Auction, Bid, Event, Person, TimestampedEvent};
use crate::velomark::config::NexmarkConfig;
use rand::prelude::*;
use std::ops::Range;

pub const PERSON_PROPORTION: u64 = 1;
pub const AUCTION_PROPORTION: u64 = 3;
pub const BID_PROPORTION: u64 = 46;
pub const PROPORTION_DENOMINATOR: u64 = PERSON_PROPORTION + AUCTION_PROPORTION + BID_PROPORTION;

pub const FIRST_PERSON_ID: u64 = 1000;
pub const FIRST_AUCTION_ID: u64 = 1000;
pub const FIRST_CATEGORY_ID: u64 = 10;
pub const NUM_CATEGORIES: u64 = 5;

/// Ids may run slightly ahead of the last created entity
const PERSON_ID_LEAD: u64 = 10;
const AUCTION_ID_LEAD: u64 = 10;

/// Granularity of the "hot" id buckets
const HOT_AUCTION_BUCKET: u64 = 100;
const HOT_SELLER_BUCKET: u64 = 100;
const HOT_BIDDER_BUCKET: u64 = 100;

const MIN_AUCTION_LENGTH_MS: i64 = 10_000;
const MAX_AUCTION_LENGTH_MS: i64 = 120_000;

pub const US_STATES: &[&str] = &["AZ", "CA", "ID", "OR", "WA", "WY"];
pub const US_CITIES: &[&str] = &[
    "Phoenix",
    "Los Angeles",
    "San Francisco",
    "Boise",
    "Portland",
    "Bend",
    "Redmond",
    "Seattle",
    "Kent",
    "Cheyenne",
];
const FIRST_NAMES: &[&str] = &[
    "Peter", "Paul", "Luke", "John", "Saul", "Vicky", "Kate", "Julie", "Sarah", "Deiter", "Walter",
];
const LAST_NAMES: &[&str] = &[
    "Shultz", "Abrams", "Spencer", "White", "Bartels", "Walton", "Smith", "Jones", "Noris",
];

/// Salt separating the streaming delay decision from event content
const DELAY_SALT: u64 = 0xD1B5_4A32_D192_ED03;

/// Generates events by number
#[derive(Debug, Clone)]
pub struct EventGenerator {
    config: NexmarkConfig,
}

impl EventGenerator {
    pub fn new(config: &NexmarkConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &NexmarkConfig {
        &self.config
    }

    /// Iterate all configured events in event-number order
    pub fn events(&self) -> impl Iterator<Item = TimestampedEvent> + '_ {
        (0..self.config.num_events).map(move |n| self.event_at(n))
    }

    /// Iterate a sub-range of event numbers
    pub fn events_in(&self, range: Range<u64>) -> impl Iterator<Item = TimestampedEvent> + '_ {
        range.map(move |n| self.event_at(n))
    }

    /// Split the event-number range into contiguous per-worker ranges
    ///
    /// Never returns more ranges than events.
    pub fn split(&self, workers: usize) -> Vec<Range<u64>> {
        let total = self.config.num_events;
        let workers = (workers.max(1) as u64).min(total.max(1));
        let chunk = total.div_ceil(workers);

        (0..workers)
            .map(|i| {
                let start = (i * chunk).min(total);
                let end = ((i + 1) * chunk).min(total);
                start..end
            })
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Whether a streaming worker holds this event back
    pub fn is_delayed(&self, event_number: u64) -> bool {
        if self.config.prob_delayed_event <= 0.0 {
            return false;
        }
        // Top 53 bits of the mixed seed as a uniform draw in [0, 1)
        let draw = (mix(self.config.seed ^ DELAY_SALT, event_number) >> 11) as f64;
        draw / ((1u64 << 53) as f64) < self.config.prob_delayed_event
    }

    /// Build the event with the given number
    pub fn event_at(&self, event_number: u64) -> TimestampedEvent {
        let timestamp = self.config.timestamp_for_event(event_number);
        let mut rng = StdRng::seed_from_u64(mix(self.config.seed, event_number));
        let rem = event_number % PROPORTION_DENOMINATOR;

        let event = if rem < PERSON_PROPORTION {
            Event::Person(self.next_person(event_number, timestamp, &mut rng))
        } else if rem < PERSON_PROPORTION + AUCTION_PROPORTION {
            Event::Auction(self.next_auction(event_number, timestamp, &mut rng))
        } else {
            Event::Bid(self.next_bid(event_number, timestamp, &mut rng))
        };

        TimestampedEvent {
            event_number,
            timestamp,
            event,
        }
    }

    fn next_person(&self, event_number: u64, timestamp: i64, rng: &mut StdRng) -> Person {
        let id = FIRST_PERSON_ID + last_base0_person_id(event_number);
        let name = format!(
            "{} {}",
            FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
            LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())]
        );
        let email_address = format!("{}@{}.com", random_word(rng, 7), random_word(rng, 5));
        let credit_card = (0..4)
            .map(|_| format!("{:04}", rng.gen_range(0..10_000)))
            .collect::<Vec<_>>()
            .join(" ");
        let city = US_CITIES[rng.gen_range(0..US_CITIES.len())].to_string();
        let state = US_STATES[rng.gen_range(0..US_STATES.len())].to_string();

        Person {
            id,
            name,
            email_address,
            credit_card,
            city,
            state,
            date_time: timestamp,
        }
    }

    fn next_auction(&self, event_number: u64, timestamp: i64, rng: &mut StdRng) -> Auction {
        let id = FIRST_AUCTION_ID + last_base0_auction_id(event_number);

        let seller = if rng.gen_range(0..self.config.hot_sellers_ratio) > 0 {
            (last_base0_person_id(event_number) / HOT_SELLER_BUCKET) * HOT_SELLER_BUCKET
        } else {
            self.next_base0_person_id(event_number, rng)
        };

        let category = FIRST_CATEGORY_ID + rng.gen_range(0..NUM_CATEGORIES);
        let initial_bid = next_price(rng);
        let reserve = initial_bid + next_price(rng);
        let expires = timestamp + rng.gen_range(MIN_AUCTION_LENGTH_MS..=MAX_AUCTION_LENGTH_MS);

        Auction {
            id,
            item_name: random_word(rng, 8),
            description: random_word(rng, 16),
            initial_bid,
            reserve,
            date_time: timestamp,
            expires,
            seller: FIRST_PERSON_ID + seller,
            category,
        }
    }

    fn next_bid(&self, event_number: u64, timestamp: i64, rng: &mut StdRng) -> Bid {
        let auction = if rng.gen_range(0..self.config.hot_auction_ratio) > 0 {
            (last_base0_auction_id(event_number) / HOT_AUCTION_BUCKET) * HOT_AUCTION_BUCKET
        } else {
            self.next_base0_auction_id(event_number, rng)
        };

        let bidder = if rng.gen_range(0..self.config.hot_bidders_ratio) > 0 {
            (last_base0_person_id(event_number) / HOT_BIDDER_BUCKET) * HOT_BIDDER_BUCKET + 1
        } else {
            self.next_base0_person_id(event_number, rng)
        };

        Bid {
            auction: FIRST_AUCTION_ID + auction,
            bidder: FIRST_PERSON_ID + bidder,
            price: next_price(rng),
            date_time: timestamp,
        }
    }

    /// A person id among the currently active people, possibly slightly ahead
    fn next_base0_person_id(&self, event_number: u64, rng: &mut StdRng) -> u64 {
        let num_people = last_base0_person_id(event_number) + 1;
        let active_people = num_people.min(self.config.num_active_people);
        let n = rng.gen_range(0..active_people + PERSON_ID_LEAD);
        num_people - active_people + n
    }

    /// An auction id among the in-flight auctions, possibly slightly ahead
    fn next_base0_auction_id(&self, event_number: u64, rng: &mut StdRng) -> u64 {
        let max_auction = last_base0_auction_id(event_number);
        let min_auction = max_auction.saturating_sub(self.config.num_in_flight_auctions);
        min_auction + rng.gen_range(0..max_auction - min_auction + 1 + AUCTION_ID_LEAD)
    }
}

/// Base-0 id of the last person created at or before this event
pub fn last_base0_person_id(event_number: u64) -> u64 {
    let epoch = event_number / PROPORTION_DENOMINATOR;
    let offset = (event_number % PROPORTION_DENOMINATOR).min(PERSON_PROPORTION - 1);
    epoch * PERSON_PROPORTION + offset
}

/// Base-0 id of the last auction created at or before this event
pub fn last_base0_auction_id(event_number: u64) -> u64 {
    let mut epoch = event_number / PROPORTION_DENOMINATOR;
    let mut offset = event_number % PROPORTION_DENOMINATOR;

    if offset < PERSON_PROPORTION {
        // Person slot: the last auction belongs to the previous epoch
        if epoch == 0 {
            return 0;
        }
        epoch -= 1;
        offset = AUCTION_PROPORTION - 1;
    } else if offset >= PERSON_PROPORTION + AUCTION_PROPORTION {
        offset = AUCTION_PROPORTION - 1;
    } else {
        offset -= PERSON_PROPORTION;
    }

    epoch * AUCTION_PROPORTION + offset
}

fn next_price(rng: &mut StdRng) -> u64 {
    (10f64.powf(rng.gen::<f64>() * 6.0) * 100.0).round() as u64
}

fn random_word(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| (b'a' + rng.gen_range(0..26u8)) as char)
        .collect()
}

/// SplitMix64 finaliser over seed and event number
fn mix(seed: u64, event_number: u64) -> u64 {
    let mut z = seed
        .wrapping_add(event_number.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
