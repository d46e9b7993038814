//! Reference models
//!
//! A model re-derives what a query must produce by walking the generated
//! events directly. Models share no code with the query operators; the only
//! common ground is the configuration and the event generator.

pub mod bid_count;
pub mod query1;
pub mod query2;
pub mod query3;
pub mod query5;
pub mod query7;

use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::types::ResultValue;
use crate::velomark::error::HarnessResult;
use crate::velomark::harness::acceptance::{Acceptance, TimestampTolerance};

pub use bid_count::BidCountModel;
pub use query1::Query1Model;
pub use query2::Query2Model;
pub use query3::Query3Model;
pub use query5::Query5Model;
pub use query7::Query7Model;

/// Computes the acceptance predicate for a query from the configuration alone
pub trait QueryModel<T: ResultValue>: Send + Sync {
    fn name(&self) -> &str;

    /// How result timestamps are compared for this query
    fn tolerance(&self) -> TimestampTolerance;

    /// Fails with `InvalidConfiguration` before doing any work on a bad config
    fn expected_results(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<T>>;
}
