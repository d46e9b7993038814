//! Synthetic Nexmark auction events

pub mod event;
pub mod generator;
pub mod source;

pub use event::{
    Auction, AuctionCount, AuctionPrice, Bid, Event, EventKind, KnownSize, NameCityStateId,
    Person, TimestampedEvent,
};
pub use generator::EventGenerator;
pub use source::{EventFeed, EventSource, NexmarkSource, SourceMessage};
