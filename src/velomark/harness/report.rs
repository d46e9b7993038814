//! Suite report generation
//!
//! Generates suite reports in multiple formats:
//! - Text (human-readable console output)
//! - JSON (machine-readable)
//! - JUnit XML (CI/CD integration)

use super::registry::KnownBroken;
use super::scenario::Scenario;
use super::verdict::{FailureKind, Verdict};
use crate::velomark::engine::types::ExecutionMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

const APPLICATION: &str = "velomark";

/// Complete suite run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Application name
    pub application: String,

    /// Run ID
    pub run_id: String,

    /// Start time (ISO 8601)
    pub start_time: String,

    /// End time (ISO 8601)
    pub end_time: String,

    /// Total duration in milliseconds
    pub duration_ms: u64,

    /// Summary statistics
    pub summary: SuiteSummary,

    /// Per-scenario results
    pub scenarios: Vec<ScenarioReport>,

    /// Scenarios carrying a known-broken marker
    pub known_broken: Vec<KnownBrokenReport>,
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Known-broken scenarios that passed
    pub unexpected_passes: usize,

    /// Failures by kind
    pub mismatches: usize,
    pub engine_failures: usize,
    pub timeouts: usize,
    pub invalid_configurations: usize,
}

/// Report for a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// `scenario/mode`
    pub name: String,
    pub scenario: String,
    pub query: String,
    pub model: String,
    pub mode: ExecutionMode,
    pub verdict: Verdict,
    pub duration_ms: u64,
    pub observed_results: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_broken: Option<KnownBroken>,

    #[serde(default)]
    pub unexpected_pass: bool,
}

impl ScenarioReport {
    pub fn new(
        scenario: &Scenario,
        verdict: Verdict,
        observed_results: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            name: scenario.qualified_name(),
            scenario: scenario.name.clone(),
            query: scenario.case.query_name().to_string(),
            model: scenario.case.model_name().to_string(),
            mode: scenario.mode,
            verdict,
            duration_ms: elapsed.as_millis() as u64,
            observed_results,
            known_broken: scenario.known_broken.clone(),
            unexpected_pass: false,
        }
    }
}

/// A known-broken scenario and what happened to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBrokenReport {
    pub name: String,
    pub tracking_ref: String,
    pub reason: String,
    /// `skipped`, `failed` or `unexpected_pass`
    pub status: String,
}

impl SuiteReport {
    pub fn new(start_time: DateTime<Utc>, scenarios: Vec<ScenarioReport>) -> Self {
        let end_time = Utc::now();
        let duration = end_time - start_time;

        let known_broken = scenarios
            .iter()
            .filter_map(|s| {
                s.known_broken.as_ref().map(|marker| KnownBrokenReport {
                    name: s.name.clone(),
                    tracking_ref: marker.tracking_ref.clone(),
                    reason: marker.reason.clone(),
                    status: if s.unexpected_pass {
                        "unexpected_pass"
                    } else if s.verdict.is_skipped() {
                        "skipped"
                    } else {
                        "failed"
                    }
                    .to_string(),
                })
            })
            .collect();

        Self {
            application: APPLICATION.to_string(),
            run_id: uuid::Uuid::new_v4().to_string(),
            start_time: start_time.to_rfc3339(),
            end_time: end_time.to_rfc3339(),
            duration_ms: duration.num_milliseconds().max(0) as u64,
            summary: calculate_summary(&scenarios),
            scenarios,
            known_broken,
        }
    }

    /// Process exit status: non-zero when any scenario that ran failed
    pub fn exit_code(&self) -> i32 {
        if self.summary.failed > 0 {
            1
        } else {
            0
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

fn calculate_summary(scenarios: &[ScenarioReport]) -> SuiteSummary {
    let mut summary = SuiteSummary {
        total: scenarios.len(),
        ..Default::default()
    };

    for scenario in scenarios {
        match &scenario.verdict {
            Verdict::Passed => summary.passed += 1,
            Verdict::Skipped { .. } => summary.skipped += 1,
            Verdict::Failed(failure) => {
                summary.failed += 1;
                match failure.kind {
                    FailureKind::AssertionMismatch => summary.mismatches += 1,
                    FailureKind::EngineFailure => summary.engine_failures += 1,
                    FailureKind::Timeout => summary.timeouts += 1,
                    FailureKind::InvalidConfiguration => summary.invalid_configurations += 1,
                }
            }
        }
        if scenario.unexpected_pass {
            summary.unexpected_passes += 1;
        }
    }

    summary
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Junit,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "junit" | "xml" => Ok(OutputFormat::Junit),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Write report to output
pub fn write_report(
    report: &SuiteReport,
    format: OutputFormat,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => write_text_report(report, writer),
        OutputFormat::Json => write_json_report(report, writer),
        OutputFormat::Junit => write_junit_report(report, writer),
    }
}

fn write_text_report(report: &SuiteReport, writer: &mut dyn Write) -> std::io::Result<()> {
    writeln!(writer, "\n🧪 Nexmark Conformance Report")?;
    writeln!(writer, "════════════════════════════════════════")?;
    writeln!(writer, "Run ID: {}", report.run_id)?;
    writeln!(writer, "Duration: {}ms", report.duration_ms)?;
    writeln!(writer)?;

    writeln!(writer, "📊 Summary")?;
    writeln!(writer, "────────────────────────────────────────")?;
    writeln!(
        writer,
        "Scenarios: {} total, {} passed, {} failed, {} skipped",
        report.summary.total, report.summary.passed, report.summary.failed, report.summary.skipped
    )?;
    if report.summary.failed > 0 {
        writeln!(
            writer,
            "Failures: {} mismatches, {} engine failures, {} timeouts, {} invalid configurations",
            report.summary.mismatches,
            report.summary.engine_failures,
            report.summary.timeouts,
            report.summary.invalid_configurations
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "📋 Scenario Results")?;
    writeln!(writer, "────────────────────────────────────────")?;

    for scenario in &report.scenarios {
        let status_icon = match &scenario.verdict {
            Verdict::Passed if scenario.unexpected_pass => "⚠️",
            Verdict::Passed => "✅",
            Verdict::Failed(failure) if failure.kind == FailureKind::AssertionMismatch => "❌",
            Verdict::Failed(_) => "💥",
            Verdict::Skipped { .. } => "⏭️",
        };

        writeln!(
            writer,
            "\n{} {} ({}ms, {} results)",
            status_icon, scenario.name, scenario.duration_ms, scenario.observed_results
        )?;

        match &scenario.verdict {
            Verdict::Failed(failure) => {
                writeln!(writer, "   {}: {}", failure.kind, failure.message)?;
                if let Some(mismatch) = &failure.mismatch {
                    for item in &mismatch.missing {
                        writeln!(writer, "      missing:    {}", item)?;
                    }
                    for item in &mismatch.unexpected {
                        writeln!(writer, "      unexpected: {}", item)?;
                    }
                    for note in &mismatch.notes {
                        writeln!(writer, "      note:       {}", note)?;
                    }
                }
            }
            Verdict::Skipped { reason } => writeln!(writer, "   {}", reason)?,
            Verdict::Passed => {}
        }

        if scenario.unexpected_pass {
            writeln!(writer, "   passed although marked known broken")?;
        }
    }

    if !report.known_broken.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "🚧 Known Broken")?;
        writeln!(writer, "────────────────────────────────────────")?;
        for entry in &report.known_broken {
            writeln!(
                writer,
                "{} [{}] {}: {}",
                entry.name, entry.tracking_ref, entry.status, entry.reason
            )?;
        }
    }

    writeln!(writer)?;
    if report.summary.failed == 0 {
        writeln!(writer, "🎉 ALL SCENARIOS PASSED!")?;
    } else {
        writeln!(writer, "❌ {} scenarios failed", report.summary.failed)?;
    }

    Ok(())
}

fn write_json_report(report: &SuiteReport, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    writeln!(writer, "{}", json)
}

/// Failures of kind mismatch are JUnit failures, everything else is an error
fn write_junit_report(report: &SuiteReport, writer: &mut dyn Write) -> std::io::Result<()> {
    let errors = report.summary.failed - report.summary.mismatches;

    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<testsuites name="{}" tests="{}" failures="{}" errors="{}" time="{:.3}">"#,
        report.application,
        report.summary.total,
        report.summary.mismatches,
        errors,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        writer,
        r#"  <testsuite name="nexmark" tests="{}" failures="{}" errors="{}" skipped="{}" time="{:.3}">"#,
        report.scenarios.len(),
        report.summary.mismatches,
        errors,
        report.summary.skipped,
        report.duration_ms as f64 / 1000.0
    )?;

    for scenario in &report.scenarios {
        writeln!(
            writer,
            r#"    <testcase name="{}" classname="{}.{}" time="{:.3}">"#,
            escape_xml(&scenario.name),
            escape_xml(&report.application),
            scenario.mode,
            scenario.duration_ms as f64 / 1000.0
        )?;

        match &scenario.verdict {
            Verdict::Failed(failure) if failure.kind == FailureKind::AssertionMismatch => {
                writeln!(
                    writer,
                    r#"      <failure type="{}" message="{}">"#,
                    failure.kind,
                    escape_xml(&failure.message)
                )?;
                if let Some(mismatch) = &failure.mismatch {
                    write!(writer, "{}", escape_xml(&mismatch.to_string()))?;
                }
                writeln!(writer, "      </failure>")?;
            }
            Verdict::Failed(failure) => {
                writeln!(
                    writer,
                    r#"      <error type="{}" message="{}">{}</error>"#,
                    failure.kind,
                    escape_xml(&failure.message),
                    escape_xml(&failure.message)
                )?;
            }
            Verdict::Skipped { reason } => {
                writeln!(writer, r#"      <skipped message="{}"/>"#, escape_xml(reason))?;
            }
            Verdict::Passed => {}
        }

        writeln!(writer, "    </testcase>")?;
    }

    writeln!(writer, "  </testsuite>")?;
    writeln!(writer, "</testsuites>")?;

    Ok(())
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
