//! Suite execution
//!
//! Runs every selected scenario in its own task with a fresh execution
//! context, bounded by `max_parallel_scenarios`. A scenario that panics or
//! fails produces a failed verdict; the others keep running.

use super::registry::ScenarioRegistry;
use super::report::{ScenarioReport, SuiteReport};
use super::scenario::{Scenario, ScenarioRun};
use super::verdict::{FailureKind, Verdict};
use super::verifier::Verifier;
use crate::velomark::config::HarnessConfig;
use crate::velomark::engine::context::{panic_message, ContextFactory, TokioContextFactory};
use crate::velomark::engine::runner::QueryRunner;
use crate::velomark::engine::types::ExecutionMode;
use crate::velomark::error::HarnessResult;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Restricts which scenarios run
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    /// Case-insensitive substring of the scenario name
    pub name: Option<String>,
    pub mode: Option<ExecutionMode>,
}

impl ScenarioFilter {
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |pattern| {
            scenario
                .name
                .to_lowercase()
                .contains(&pattern.to_lowercase())
        });
        let mode_ok = self.mode.map_or(true, |mode| scenario.mode == mode);
        name_ok && mode_ok
    }
}

pub struct SuiteRunner {
    config: HarnessConfig,
    factory: Arc<dyn ContextFactory>,
    filter: ScenarioFilter,
}

impl SuiteRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            factory: Arc::new(TokioContextFactory),
            filter: ScenarioFilter::default(),
        }
    }

    pub fn with_context_factory(mut self, factory: Arc<dyn ContextFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_filter(mut self, filter: ScenarioFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the selected scenarios and collect their reports in registry order
    pub async fn run(&self, registry: &ScenarioRegistry) -> HarnessResult<SuiteReport> {
        self.config.validate()?;

        let started = chrono::Utc::now();
        let scenarios: Vec<Scenario> = registry
            .scenarios()
            .into_iter()
            .filter(|s| self.filter.matches(s))
            .collect();

        log::info!(
            "Running {} scenarios ({} events, {} generators, parallelism {})",
            scenarios.len(),
            self.config.nexmark.num_events,
            self.config.nexmark.num_event_generators,
            self.config.max_parallel_scenarios
        );

        let parallelism = self.config.max_parallel_scenarios.max(1);
        let mut reports: Vec<(usize, ScenarioReport)> =
            stream::iter(scenarios.into_iter().enumerate())
                .map(|(index, scenario)| async move { (index, self.run_one(scenario).await) })
                .buffer_unordered(parallelism)
                .collect()
                .await;
        reports.sort_by_key(|(index, _)| *index);

        Ok(SuiteReport::new(
            started,
            reports.into_iter().map(|(_, report)| report).collect(),
        ))
    }

    async fn run_one(&self, scenario: Scenario) -> ScenarioReport {
        let qualified = scenario.qualified_name();
        let mut run = ScenarioRun::new(qualified.clone());

        if let Some(marker) = &scenario.known_broken {
            if !self.config.include_known_broken {
                let reason = marker.to_string();
                let verdict = match run.skip(reason.clone()) {
                    Ok(()) => Verdict::Skipped { reason },
                    Err(e) => Verdict::failed(FailureKind::EngineFailure, e.to_string()),
                };
                return ScenarioReport::new(&scenario, verdict, 0, run.elapsed());
            }
        }

        if let Err(e) = run.start() {
            return ScenarioReport::new(
                &scenario,
                Verdict::failed(FailureKind::EngineFailure, e.to_string()),
                0,
                run.elapsed(),
            );
        }

        let started = Instant::now();
        let context = self.factory.create(&qualified);
        let nexmark = self.config.nexmark.clone();
        let timeout = self.config.timeout();
        let verifier = Verifier::new(self.config.mismatch_sample_limit);
        let case = Arc::clone(&scenario.case);
        let mode = scenario.mode;

        let task = {
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                let runner = QueryRunner::new(context, timeout);
                case.execute(&runner, &nexmark, mode, &verifier).await
            })
        };

        let (verdict, observed) = match task.await {
            Ok(outcome) => (outcome.verdict, outcome.observed_results),
            Err(e) if e.is_panic() => {
                let message = match e.try_into_panic() {
                    Ok(payload) => panic_message(&*payload),
                    Err(e) => e.to_string(),
                };
                (
                    Verdict::failed(
                        FailureKind::EngineFailure,
                        format!("scenario panicked: {}", message),
                    ),
                    0,
                )
            }
            Err(e) => (Verdict::failed(FailureKind::EngineFailure, e.to_string()), 0),
        };

        if context.active_jobs() > 0 {
            log::warn!(
                "{} left {} jobs running in context '{}'",
                qualified,
                context.active_jobs(),
                context.name()
            );
        }

        if let Err(e) = run.finish(verdict.clone()) {
            log::error!("{}", e);
        }

        let mut report = ScenarioReport::new(&scenario, verdict, observed, started.elapsed());
        if let Some(marker) = &scenario.known_broken {
            if report.verdict.is_passed() {
                log::warn!(
                    "⚠️  {} is marked {} but passed; the marker can be removed",
                    qualified,
                    marker
                );
                report.unexpected_pass = true;
            }
        }
        report
    }
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("filter", &self.filter)
            .finish()
    }
}
