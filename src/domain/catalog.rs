//! Registry of scenarios by name

use std::collections::BTreeMap;

use crate::domain::scenario::Scenario;
use crate::domain::scenarios::{self, GENERATOR_SUITE, GENERATOR_SUITE_MEMBERS};
use crate::domain::types::ScenarioName;
use crate::error::{Error, Result};

/// Name-to-producer registry
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<ScenarioName, Scenario>,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding every built-in scenario.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for scenario in scenarios::builtin()? {
            catalog.register(scenario)?;
        }
        Ok(catalog)
    }

    /// Adds a scenario. Names are unique.
    pub fn register(&mut self, scenario: Scenario) -> Result<()> {
        if self.scenarios.contains_key(scenario.name()) {
            return Err(Error::DuplicateScenario {
                name: scenario.name().to_string(),
            });
        }
        self.scenarios.insert(scenario.name().clone(), scenario);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Scenario> {
        ScenarioName::try_new(name.to_string())
            .ok()
            .and_then(|key| self.scenarios.get(&key))
            .ok_or_else(|| Error::ScenarioNotFound {
                name: name.to_string(),
            })
    }

    /// Looks up every requested name, expanding the generator suite
    /// selection. Fails on the first unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Scenario>> {
        let mut resolved = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.eq_ignore_ascii_case(GENERATOR_SUITE) {
                for member in GENERATOR_SUITE_MEMBERS {
                    resolved.push(self.get(member)?);
                }
            } else {
                resolved.push(self.get(name)?);
            }
        }
        Ok(resolved)
    }

    /// Registered scenarios in name order.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
