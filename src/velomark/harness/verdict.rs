//! Scenario verdicts and mismatch diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Samples kept while a predicate builds its report; the verifier trims further
pub const MAX_RECORDED_SAMPLES: usize = 100;

/// Why a scenario failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidConfiguration,
    EngineFailure,
    Timeout,
    AssertionMismatch,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidConfiguration => write!(f, "invalid configuration"),
            FailureKind::EngineFailure => write!(f, "engine failure"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::AssertionMismatch => write!(f, "assertion mismatch"),
        }
    }
}

/// Diagnosable difference between observed and expected output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchReport {
    /// What the model expected, in words
    pub expectation: String,

    /// Number of observed results
    pub observed_count: usize,

    /// Number of results the model expected, when it is a fixed number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_count: Option<usize>,

    /// Total expected results that were not observed
    pub missing_total: usize,

    /// Total observed results the model did not expect
    pub unexpected_total: usize,

    /// Sample of missing results
    pub missing: Vec<String>,

    /// Sample of unexpected results
    pub unexpected: Vec<String>,

    /// Free-form findings that are not a single result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl MismatchReport {
    pub fn new(expectation: impl Into<String>, observed_count: usize) -> Self {
        Self {
            expectation: expectation.into(),
            observed_count,
            ..Default::default()
        }
    }

    pub fn with_expected_count(mut self, expected_count: usize) -> Self {
        self.expected_count = Some(expected_count);
        self
    }

    pub fn record_missing(&mut self, item: impl fmt::Display) {
        self.missing_total += 1;
        if self.missing.len() < MAX_RECORDED_SAMPLES {
            self.missing.push(item.to_string());
        }
    }

    pub fn record_unexpected(&mut self, item: impl fmt::Display) {
        self.unexpected_total += 1;
        if self.unexpected.len() < MAX_RECORDED_SAMPLES {
            self.unexpected.push(item.to_string());
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        if self.notes.len() < MAX_RECORDED_SAMPLES {
            self.notes.push(note.into());
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing_total == 0 && self.unexpected_total == 0 && self.notes.is_empty()
    }

    /// Keep at most `limit` samples of each kind
    pub fn truncate(&mut self, limit: usize) {
        self.missing.truncate(limit);
        self.unexpected.truncate(limit);
        self.notes.truncate(limit);
    }

    pub fn summary(&self) -> String {
        let expected = self
            .expected_count
            .map(|c| format!("expected {} results", c))
            .unwrap_or_else(|| "expected count not fixed".to_string());
        format!(
            "{}: observed {} results, {}, {} missing, {} unexpected",
            self.expectation, self.observed_count, expected, self.missing_total, self.unexpected_total
        )
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for item in &self.missing {
            writeln!(f, "  missing:    {}", item)?;
        }
        for item in &self.unexpected {
            writeln!(f, "  unexpected: {}", item)?;
        }
        for note in &self.notes {
            writeln!(f, "  note:       {}", note)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<MismatchReport>,
}

/// Final result of one scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed(ScenarioFailure),
    Skipped { reason: String },
}

impl Verdict {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Verdict::Failed(ScenarioFailure {
            kind,
            message: message.into(),
            mismatch: None,
        })
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Verdict::Skipped { .. })
    }

    pub fn failure(&self) -> Option<&ScenarioFailure> {
        match self {
            Verdict::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Failed(failure) => write!(f, "failed ({}): {}", failure.kind, failure.message),
            Verdict::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}
