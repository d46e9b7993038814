//! Scenarios and their lifecycle
//!
//! A scenario is one registered (query, model) pair bound to one execution
//! mode. Its run moves through a small state machine:
//!
//! ```text
//! Registered -> Running -> Passed | Failed
//! Registered -> Skipped
//! ```
//!
//! Terminal states never transition again.

use super::acceptance::Acceptance;
use super::registry::KnownBroken;
use super::verdict::{FailureKind, Verdict};
use super::verifier::Verifier;
use crate::velomark::config::NexmarkConfig;
use crate::velomark::engine::operator::QueryDefinition;
use crate::velomark::engine::runner::QueryRunner;
use crate::velomark::engine::types::{ExecutionMode, ResultValue};
use crate::velomark::error::{HarnessError, HarnessResult};
use crate::velomark::models::QueryModel;
use crate::velomark::nexmark::source::{EventSource, NexmarkSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What one execution of a scenario produced
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub verdict: Verdict,
    /// Results observed from the query, zero when it never ran to completion
    pub observed_results: usize,
}

/// Something the suite can execute for a given mode
#[async_trait]
pub trait ScenarioCase: Send + Sync {
    fn query_name(&self) -> &str;

    fn model_name(&self) -> &str;

    async fn execute(
        &self,
        runner: &QueryRunner,
        config: &NexmarkConfig,
        mode: ExecutionMode,
        verifier: &Verifier,
    ) -> ScenarioOutcome;
}

/// A query checked against its model
pub struct QueryScenario<T: ResultValue> {
    query: Arc<dyn QueryDefinition<T>>,
    model: Arc<dyn QueryModel<T>>,
    source: Arc<dyn EventSource>,
}

impl<T: ResultValue> QueryScenario<T> {
    pub fn new(
        query: impl QueryDefinition<T> + 'static,
        model: impl QueryModel<T> + 'static,
    ) -> Self {
        Self {
            query: Arc::new(query),
            model: Arc::new(model),
            source: Arc::new(NexmarkSource::new()),
        }
    }

    pub fn with_source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// The model runs on the blocking pool so large configurations do not stall the runtime
    async fn acceptance(&self, config: &NexmarkConfig) -> HarnessResult<Acceptance<T>> {
        let model = Arc::clone(&self.model);
        let config = config.clone();
        tokio::task::spawn_blocking(move || model.expected_results(&config))
            .await
            .map_err(|e| HarnessError::EngineFailure {
                message: "model computation did not finish".to_string(),
                query_name: self.model.name().to_string(),
                source: Some(e.to_string()),
            })?
    }
}

#[async_trait]
impl<T: ResultValue> ScenarioCase for QueryScenario<T> {
    fn query_name(&self) -> &str {
        self.query.name()
    }

    fn model_name(&self) -> &str {
        self.model.name()
    }

    async fn execute(
        &self,
        runner: &QueryRunner,
        config: &NexmarkConfig,
        mode: ExecutionMode,
        verifier: &Verifier,
    ) -> ScenarioOutcome {
        let acceptance = match self.acceptance(config).await {
            Ok(acceptance) => acceptance,
            Err(e) => {
                return ScenarioOutcome {
                    verdict: verifier.verdict_for(&e),
                    observed_results: 0,
                }
            }
        };

        match runner
            .run(self.query.as_ref(), self.source.as_ref(), config, mode)
            .await
        {
            Ok(observed) => ScenarioOutcome {
                verdict: verifier.verify(&observed, &acceptance),
                observed_results: observed.len(),
            },
            Err(e) => ScenarioOutcome {
                verdict: verifier.verdict_for(&e),
                observed_results: 0,
            },
        }
    }
}

/// One registered entry bound to one mode
#[derive(Clone)]
pub struct Scenario {
    pub name: String,
    pub mode: ExecutionMode,
    pub case: Arc<dyn ScenarioCase>,
    pub known_broken: Option<KnownBroken>,
}

impl Scenario {
    /// `name/mode`, unique within a registry
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.name, self.mode)
    }

    pub fn is_known_broken(&self) -> bool {
        self.known_broken.is_some()
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("query", &self.case.query_name())
            .field("model", &self.case.model_name())
            .field("known_broken", &self.known_broken)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioState {
    Registered,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl ScenarioState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScenarioState::Passed | ScenarioState::Failed | ScenarioState::Skipped
        )
    }

    pub fn can_transition_to(&self, next: ScenarioState) -> bool {
        matches!(
            (self, next),
            (ScenarioState::Registered, ScenarioState::Running)
                | (ScenarioState::Registered, ScenarioState::Skipped)
                | (ScenarioState::Running, ScenarioState::Passed)
                | (ScenarioState::Running, ScenarioState::Failed)
        )
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioState::Registered => "registered",
            ScenarioState::Running => "running",
            ScenarioState::Passed => "passed",
            ScenarioState::Failed => "failed",
            ScenarioState::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle of a single scenario execution
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    scenario: String,
    state: ScenarioState,
    verdict: Option<Verdict>,
    started: Option<Instant>,
    elapsed: Duration,
}

impl ScenarioRun {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            state: ScenarioState::Registered,
            verdict: None,
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn start(&mut self) -> HarnessResult<()> {
        self.transition(ScenarioState::Running)?;
        self.started = Some(Instant::now());
        log::info!("▶️  {} started", self.scenario);
        Ok(())
    }

    /// Record the verdict of a running scenario
    pub fn finish(&mut self, verdict: Verdict) -> HarnessResult<()> {
        let next = match &verdict {
            Verdict::Passed => ScenarioState::Passed,
            Verdict::Failed(_) => ScenarioState::Failed,
            Verdict::Skipped { .. } => ScenarioState::Skipped,
        };
        self.transition(next)?;
        self.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();

        match &verdict {
            Verdict::Passed => log::info!("✅ {} passed in {:?}", self.scenario, self.elapsed),
            Verdict::Failed(failure) if failure.kind == FailureKind::AssertionMismatch => {
                log::warn!("❌ {} failed: {}", self.scenario, failure.message)
            }
            Verdict::Failed(failure) => {
                log::error!("💥 {} failed: {}", self.scenario, failure.message)
            }
            Verdict::Skipped { .. } => {}
        }
        self.verdict = Some(verdict);
        Ok(())
    }

    pub fn skip(&mut self, reason: impl Into<String>) -> HarnessResult<()> {
        self.transition(ScenarioState::Skipped)?;
        let reason = reason.into();
        log::info!("⏭️  {} skipped: {}", self.scenario, reason);
        self.verdict = Some(Verdict::Skipped { reason });
        Ok(())
    }

    fn transition(&mut self, next: ScenarioState) -> HarnessResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(HarnessError::InvalidStateTransition {
                scenario: self.scenario.clone(),
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}
