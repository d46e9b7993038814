//! Differential conformance harness
//!
//! Runs each registered query against the Nexmark source in batch and
//! streaming mode and checks the observed output against an independently
//! computed model.
//!
//! ## Components
//!
//! - [`acceptance`]: acceptance predicates and timestamp tolerances
//! - [`verdict`]: verdicts and mismatch diagnostics
//! - [`verifier`]: applies a predicate to observed output
//! - [`scenario`]: scenario cases and their lifecycle
//! - [`registry`]: the explicit scenario registry
//! - [`suite`]: runs scenarios concurrently
//! - [`report`]: text, JSON and JUnit reports

pub mod acceptance;
pub mod registry;
pub mod report;
pub mod scenario;
pub mod suite;
pub mod verdict;
pub mod verifier;

pub use acceptance::{Acceptance, TimestampTolerance};
pub use registry::{KnownBroken, ScenarioEntry, ScenarioRegistry};
pub use report::{write_report, OutputFormat, ScenarioReport, SuiteReport, SuiteSummary};
pub use scenario::{QueryScenario, Scenario, ScenarioCase, ScenarioOutcome, ScenarioRun, ScenarioState};
pub use suite::{ScenarioFilter, SuiteRunner};
pub use verdict::{FailureKind, MismatchReport, ScenarioFailure, Verdict};
pub use verifier::Verifier;
