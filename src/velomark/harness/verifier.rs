//! Verifier
//!
//! Applies an acceptance predicate to the complete observed collection and
//! turns the answer, or any error that prevented an answer, into a verdict.

use super::acceptance::Acceptance;
use super::verdict::{FailureKind, ScenarioFailure, Verdict};
use crate::velomark::engine::types::{ResultValue, TimestampedResult};
use crate::velomark::error::HarnessError;

pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct Verifier {
    sample_limit: usize,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_LIMIT)
    }
}

impl Verifier {
    pub fn new(sample_limit: usize) -> Self {
        Self { sample_limit }
    }

    pub fn sample_limit(&self) -> usize {
        self.sample_limit
    }

    pub fn verify<T: ResultValue>(
        &self,
        observed: &[TimestampedResult<T>],
        acceptance: &Acceptance<T>,
    ) -> Verdict {
        match acceptance.check(observed) {
            Ok(()) => Verdict::Passed,
            Err(mut report) => {
                report.truncate(self.sample_limit);
                log::debug!("Mismatch for '{}':\n{}", acceptance.description(), report);
                Verdict::Failed(ScenarioFailure {
                    kind: FailureKind::AssertionMismatch,
                    message: report.summary(),
                    mismatch: Some(report),
                })
            }
        }
    }

    /// The failed verdict for an error raised before verification could run
    pub fn verdict_for(&self, error: &HarnessError) -> Verdict {
        let kind = match error {
            HarnessError::InvalidConfiguration { .. } | HarnessError::ConfigParseError { .. } => {
                FailureKind::InvalidConfiguration
            }
            HarnessError::Timeout { .. } => FailureKind::Timeout,
            HarnessError::AssertionMismatch { .. } => FailureKind::AssertionMismatch,
            HarnessError::EngineFailure { .. }
            | HarnessError::DuplicateScenario { .. }
            | HarnessError::InvalidStateTransition { .. }
            | HarnessError::IoError { .. } => FailureKind::EngineFailure,
        };
        Verdict::failed(kind, error.to_string())
    }
}
