//! Nexmark query implementations
//!
//! Each query is a [`QueryDefinition`](crate::velomark::engine::QueryDefinition)
//! whose operator is driven identically in batch and streaming mode. Windowed
//! queries emit when the pipeline watermark closes a window, and every
//! windowed result carries the window's maximum timestamp.

pub mod bid_count;
pub mod query1;
pub mod query2;
pub mod query3;
pub mod query5;
pub mod query7;

pub use bid_count::BidCountPerAuction;
pub use query1::{Query1, DOLLAR_TO_EURO_NUMERATOR, DOLLAR_TO_EURO_DENOMINATOR};
pub use query2::Query2;
pub use query3::{Query3, LOCAL_CATEGORY, LOCAL_STATES};
pub use query5::Query5;
pub use query7::Query7;
