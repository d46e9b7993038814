//! Nexmark event and result records
//!
//! The auction system produces three kinds of events: a new [`Person`], a new
//! [`Auction`], or a [`Bid`] on an auction. Query outputs reuse [`Bid`] or one
//! of the projection records defined here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything whose encoded size can be estimated
pub trait KnownSize {
    fn size_in_bytes(&self) -> usize;
}

const ID_BYTES: usize = 8;
const TIMESTAMP_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub email_address: String,
    pub credit_card: String,
    pub city: String,
    pub state: String,
    pub date_time: i64,
}

impl KnownSize for Person {
    fn size_in_bytes(&self) -> usize {
        ID_BYTES
            + self.name.len()
            + self.email_address.len()
            + self.credit_card.len()
            + self.city.len()
            + self.state.len()
            + TIMESTAMP_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub item_name: String,
    pub description: String,
    /// Cents
    pub initial_bid: u64,
    /// Cents
    pub reserve: u64,
    pub date_time: i64,
    pub expires: i64,
    pub seller: u64,
    pub category: u64,
}

impl KnownSize for Auction {
    fn size_in_bytes(&self) -> usize {
        ID_BYTES
            + self.item_name.len()
            + self.description.len()
            + 8
            + 8
            + TIMESTAMP_BYTES
            + TIMESTAMP_BYTES
            + ID_BYTES
            + ID_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bid {
    /// Auction this bid is for
    pub auction: u64,
    pub bidder: u64,
    /// Cents
    pub price: u64,
    pub date_time: i64,
}

impl KnownSize for Bid {
    fn size_in_bytes(&self) -> usize {
        ID_BYTES + ID_BYTES + 8 + TIMESTAMP_BYTES
    }
}

/// Kind of an [`Event`], used for logging and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Person,
    Auction,
    Bid,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Person => write!(f, "person"),
            EventKind::Auction => write!(f, "auction"),
            EventKind::Bid => write!(f, "bid"),
        }
    }
}

/// A single event in the auction system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    Person(Person),
    Auction(Auction),
    Bid(Bid),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Person(_) => EventKind::Person,
            Event::Auction(_) => EventKind::Auction,
            Event::Bid(_) => EventKind::Bid,
        }
    }

    pub fn as_bid(&self) -> Option<&Bid> {
        match self {
            Event::Bid(bid) => Some(bid),
            _ => None,
        }
    }
}

impl KnownSize for Event {
    fn size_in_bytes(&self) -> usize {
        1 + match self {
            Event::Person(p) => p.size_in_bytes(),
            Event::Auction(a) => a.size_in_bytes(),
            Event::Bid(b) => b.size_in_bytes(),
        }
    }
}

/// An event together with its position in the generated sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    /// 0-based position in the logical sequence
    pub event_number: u64,
    /// Event time in epoch milliseconds
    pub timestamp: i64,
    pub event: Event,
}

/// Query2 output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuctionPrice {
    pub auction: u64,
    pub price: u64,
}

impl KnownSize for AuctionPrice {
    fn size_in_bytes(&self) -> usize {
        ID_BYTES + 8
    }
}

/// Query3 output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameCityStateId {
    pub name: String,
    pub city: String,
    pub state: String,
    pub id: u64,
}

impl KnownSize for NameCityStateId {
    fn size_in_bytes(&self) -> usize {
        self.name.len() + self.city.len() + self.state.len() + ID_BYTES
    }
}

/// Query5 and bid-count output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuctionCount {
    pub auction: u64,
    pub count: u64,
}

impl KnownSize for AuctionCount {
    fn size_in_bytes(&self) -> usize {
        ID_BYTES + 8
    }
}
