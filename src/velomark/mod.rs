pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod models;
pub mod nexmark;
pub mod queries;

// Re-export the types most callers need
pub use config::{HarnessConfig, NexmarkConfig};
pub use engine::{ExecutionMode, QueryRunner, TimestampedResult};
pub use error::{EngineError, HarnessError, HarnessResult};
pub use harness::{ScenarioRegistry, SuiteRunner, Verdict, Verifier};
