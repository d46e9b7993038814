//! Acceptance predicates
//!
//! A model never hands the verifier a fixed result list. It hands over an
//! [`Acceptance`]: a description, the timestamp tolerance it was written
//! for, and a predicate over the complete observed collection. The multiset
//! helpers cover the common "these results, in any order" case; models with
//! looser expectations supply their own predicate.

use super::verdict::MismatchReport;
use crate::velomark::engine::types::{ResultValue, Timestamp, TimestampedResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// How strictly result timestamps are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampTolerance {
    /// Timestamps must match exactly
    Exact,
    /// Timestamps may differ by at most this many milliseconds
    Within(i64),
    /// Only values are compared
    Ignore,
}

impl fmt::Display for TimestampTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampTolerance::Exact => write!(f, "exact timestamps"),
            TimestampTolerance::Within(ms) => write!(f, "timestamps within {}ms", ms),
            TimestampTolerance::Ignore => write!(f, "timestamps ignored"),
        }
    }
}

pub type Predicate<T> =
    Box<dyn Fn(&[TimestampedResult<T>]) -> Result<(), MismatchReport> + Send + Sync>;

/// What a model accepts as correct output
pub struct Acceptance<T> {
    description: String,
    tolerance: TimestampTolerance,
    predicate: Predicate<T>,
}

impl<T> fmt::Debug for Acceptance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptance")
            .field("description", &self.description)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl<T: ResultValue> Acceptance<T> {
    pub fn new<F>(description: impl Into<String>, tolerance: TimestampTolerance, predicate: F) -> Self
    where
        F: Fn(&[TimestampedResult<T>]) -> Result<(), MismatchReport> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            tolerance,
            predicate: Box::new(predicate),
        }
    }

    /// Accept exactly this multiset of results, compared under `tolerance`
    pub fn multiset(
        description: impl Into<String>,
        expected: Vec<TimestampedResult<T>>,
        tolerance: TimestampTolerance,
    ) -> Self {
        let description = description.into();
        let label = description.clone();
        Self::new(description, tolerance, move |observed| {
            compare_multisets(&label, &expected, observed, tolerance)
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tolerance(&self) -> TimestampTolerance {
        self.tolerance
    }

    pub fn check(&self, observed: &[TimestampedResult<T>]) -> Result<(), MismatchReport> {
        (self.predicate)(observed)
    }
}

/// Multiset comparison of expected and observed results
pub fn compare_multisets<T: ResultValue>(
    description: &str,
    expected: &[TimestampedResult<T>],
    observed: &[TimestampedResult<T>],
    tolerance: TimestampTolerance,
) -> Result<(), MismatchReport> {
    let mut report = MismatchReport::new(
        format!("{} ({})", description, tolerance),
        observed.len(),
    )
    .with_expected_count(expected.len());

    match tolerance {
        TimestampTolerance::Exact => diff_exact(expected, observed, &mut report),
        TimestampTolerance::Ignore => diff_values(expected, observed, &mut report),
        TimestampTolerance::Within(ms) => diff_within(expected, observed, ms, &mut report),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(report)
    }
}

fn diff_exact<T: ResultValue>(
    expected: &[TimestampedResult<T>],
    observed: &[TimestampedResult<T>],
    report: &mut MismatchReport,
) {
    let mut balance: HashMap<&TimestampedResult<T>, i64> = HashMap::new();
    for result in expected {
        *balance.entry(result).or_insert(0) += 1;
    }
    for result in observed {
        *balance.entry(result).or_insert(0) -= 1;
    }
    record_balance(balance, report);
}

fn diff_values<T: ResultValue>(
    expected: &[TimestampedResult<T>],
    observed: &[TimestampedResult<T>],
    report: &mut MismatchReport,
) {
    let mut balance: HashMap<&T, i64> = HashMap::new();
    for result in expected {
        *balance.entry(&result.value).or_insert(0) += 1;
    }
    for result in observed {
        *balance.entry(&result.value).or_insert(0) -= 1;
    }

    let mut entries: Vec<_> = balance.into_iter().filter(|(_, n)| *n != 0).collect();
    entries.sort();
    for (value, n) in entries {
        for _ in 0..n.abs() {
            if n > 0 {
                report.record_missing(format!("{:?}", value));
            } else {
                report.record_unexpected(format!("{:?}", value));
            }
        }
    }
}

/// Match timestamps per value greedily in time order
fn diff_within<T: ResultValue>(
    expected: &[TimestampedResult<T>],
    observed: &[TimestampedResult<T>],
    tolerance_ms: i64,
    report: &mut MismatchReport,
) {
    let mut by_value: BTreeMap<&T, (Vec<Timestamp>, Vec<Timestamp>)> = BTreeMap::new();
    for result in expected {
        by_value.entry(&result.value).or_default().0.push(result.timestamp);
    }
    for result in observed {
        by_value.entry(&result.value).or_default().1.push(result.timestamp);
    }

    for (value, (mut want, mut got)) in by_value {
        want.sort_unstable();
        got.sort_unstable();
        let (mut i, mut j) = (0, 0);
        while i < want.len() && j < got.len() {
            if (want[i] - got[j]).abs() <= tolerance_ms {
                i += 1;
                j += 1;
            } else if got[j] < want[i] {
                report.record_unexpected(TimestampedResult::new(value, got[j]));
                j += 1;
            } else {
                report.record_missing(TimestampedResult::new(value, want[i]));
                i += 1;
            }
        }
        for ts in &want[i..] {
            report.record_missing(TimestampedResult::new(value, *ts));
        }
        for ts in &got[j..] {
            report.record_unexpected(TimestampedResult::new(value, *ts));
        }
    }
}

fn record_balance<T: ResultValue>(
    balance: HashMap<&TimestampedResult<T>, i64>,
    report: &mut MismatchReport,
) {
    let mut entries: Vec<_> = balance.into_iter().filter(|(_, n)| *n != 0).collect();
    entries.sort();
    for (result, n) in entries {
        for _ in 0..n.abs() {
            if n > 0 {
                report.record_missing(result);
            } else {
                report.record_unexpected(result);
            }
        }
    }
}
