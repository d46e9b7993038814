//! Scenario registry
//!
//! Built explicitly at process start. Each entry names a (query, model)
//! pair, the modes it runs in, and optionally a known-broken marker that
//! points at the issue tracking the failure.

use super::scenario::{QueryScenario, Scenario, ScenarioCase};
use crate::velomark::engine::operator::QueryDefinition;
use crate::velomark::engine::types::{ExecutionMode, ResultValue};
use crate::velomark::error::{HarnessError, HarnessResult};
use crate::velomark::models::{
    BidCountModel, Query1Model, Query2Model, Query3Model, Query5Model, Query7Model, QueryModel,
};
use crate::velomark::queries::{BidCountPerAuction, Query1, Query2, Query3, Query5, Query7};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Marks a scenario that is expected to fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBroken {
    /// Issue tracker reference
    pub tracking_ref: String,
    pub reason: String,
}

impl fmt::Display for KnownBroken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "known broken ({}): {}", self.tracking_ref, self.reason)
    }
}

/// A registered (query, model) pair
#[derive(Clone)]
pub struct ScenarioEntry {
    pub name: String,
    pub case: Arc<dyn ScenarioCase>,
    pub modes: Vec<ExecutionMode>,
    pub known_broken: Option<KnownBroken>,
}

impl ScenarioEntry {
    /// Entry for a query and its model against the Nexmark source, in both modes
    pub fn new<T: ResultValue>(
        name: impl Into<String>,
        query: impl QueryDefinition<T> + 'static,
        model: impl QueryModel<T> + 'static,
    ) -> Self {
        Self::from_case(name, Arc::new(QueryScenario::new(query, model)))
    }

    pub fn from_case(name: impl Into<String>, case: Arc<dyn ScenarioCase>) -> Self {
        Self {
            name: name.into(),
            case,
            modes: ExecutionMode::ALL.to_vec(),
            known_broken: None,
        }
    }

    pub fn with_modes(mut self, modes: &[ExecutionMode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn known_broken(mut self, tracking_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        self.known_broken = Some(KnownBroken {
            tracking_ref: tracking_ref.into(),
            reason: reason.into(),
        });
        self
    }

    fn scenarios(&self) -> impl Iterator<Item = Scenario> + '_ {
        self.modes.iter().map(move |mode| Scenario {
            name: self.name.clone(),
            mode: *mode,
            case: Arc::clone(&self.case),
            known_broken: self.known_broken.clone(),
        })
    }
}

impl fmt::Debug for ScenarioEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioEntry")
            .field("name", &self.name)
            .field("query", &self.case.query_name())
            .field("modes", &self.modes)
            .field("known_broken", &self.known_broken)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    entries: Vec<ScenarioEntry>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Nexmark query suite
    pub fn nexmark() -> HarnessResult<Self> {
        let mut registry = Self::new();
        registry.register(ScenarioEntry::new("Query1", Query1, Query1Model))?;
        registry.register(ScenarioEntry::new("Query2", Query2, Query2Model))?;
        registry.register(ScenarioEntry::new("Query3", Query3, Query3Model))?;
        registry.register(
            ScenarioEntry::new("Query5", Query5, Query5Model).known_broken(
                "BEAM-7072",
                "hot items output does not match the reference",
            ),
        )?;
        registry.register(ScenarioEntry::new("Query7", Query7, Query7Model))?;
        registry.register(ScenarioEntry::new(
            "BidCountPerAuction",
            BidCountPerAuction,
            BidCountModel,
        ))?;
        Ok(registry)
    }

    pub fn register(&mut self, entry: ScenarioEntry) -> HarnessResult<()> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(HarnessError::DuplicateScenario { name: entry.name });
        }
        if entry.modes.is_empty() {
            return Err(HarnessError::invalid_config(
                "modes",
                format!("scenario '{}' has no execution modes", entry.name),
            ));
        }
        log::debug!(
            "Registered scenario '{}' ({} modes{})",
            entry.name,
            entry.modes.len(),
            if entry.known_broken.is_some() {
                ", known broken"
            } else {
                ""
            }
        );
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ScenarioEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every (entry, mode) pair in registration order
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.entries.iter().flat_map(|e| e.scenarios()).collect()
    }

    /// Scenarios that run by default
    pub fn enabled(&self) -> Vec<Scenario> {
        self.scenarios()
            .into_iter()
            .filter(|s| !s.is_known_broken())
            .collect()
    }

    /// Scenarios skipped because of a known-broken marker
    pub fn known_broken(&self) -> Vec<Scenario> {
        self.scenarios()
            .into_iter()
            .filter(|s| s.is_known_broken())
            .collect()
    }
}
