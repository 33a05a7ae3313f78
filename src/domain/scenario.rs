//! Scenario definitions and their test oracles
//!
//! A scenario is a pure producer of events plus the outcome the system
//! under test is expected to show after receiving them. The harness never
//! evaluates the expectation; it is reported so an operator (or a test
//! against the engine) can compare.

use std::fmt;

use crate::domain::events::ScheduledEvent;
use crate::domain::types::{ScenarioBase, ScenarioName};
use crate::error::{Error, Result};

/// Pure event producer. No I/O, no sleeping.
pub type ScenarioFn = fn(&ScenarioBase) -> Result<Vec<ScheduledEvent>>;

/// Counters exposed by the join engine's metrics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum EngineCounter {
    #[display("clicksReceived")]
    ClicksReceived,
    #[display("pageViewsReceived")]
    PageViewsReceived,
    #[display("pageViewsEmitted")]
    PageViewsEmitted,
    #[display("pageViewsUpdated")]
    PageViewsUpdated,
    #[display("clicksDroppedLate")]
    ClicksDroppedLate,
    #[display("pageViewsDroppedLate")]
    PageViewsDroppedLate,
    #[display("clickStateSize")]
    ClickStateSize,
    #[display("pageViewStateSize")]
    PageViewStateSize,
}

/// How a counter is expected to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterExpectation {
    /// Grows by this much relative to before the run
    Increase(u32),
    /// Ends at exactly this value (fresh engine)
    Exactly(u32),
}

/// Expected attribution of one page view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAttribution {
    pub page_view_id: String,
    /// `None` means the view is emitted with null attribution.
    pub click_id: Option<String>,
}

/// The oracle of a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    summary: String,
    attributions: Vec<ExpectedAttribution>,
    dropped_late: Vec<String>,
    counters: Vec<(EngineCounter, CounterExpectation)>,
}

impl Expectation {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn attributes(mut self, page_view_id: &str, click_id: &str) -> Self {
        self.attributions.push(ExpectedAttribution {
            page_view_id: page_view_id.to_string(),
            click_id: Some(click_id.to_string()),
        });
        self
    }

    pub fn unattributed(mut self, page_view_id: &str) -> Self {
        self.attributions.push(ExpectedAttribution {
            page_view_id: page_view_id.to_string(),
            click_id: None,
        });
        self
    }

    pub fn dropped_late(mut self, business_id: &str) -> Self {
        self.dropped_late.push(business_id.to_string());
        self
    }

    pub fn counter(mut self, counter: EngineCounter, expectation: CounterExpectation) -> Self {
        self.counters.push((counter, expectation));
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn attributions(&self) -> &[ExpectedAttribution] {
        &self.attributions
    }

    /// `Some(None)` for a view expected unattributed, `None` if the view is
    /// not part of the oracle.
    pub fn attribution_for(&self, page_view_id: &str) -> Option<Option<&str>> {
        self.attributions
            .iter()
            .find(|a| a.page_view_id == page_view_id)
            .map(|a| a.click_id.as_deref())
    }

    pub fn is_dropped_late(&self, business_id: &str) -> bool {
        self.dropped_late.iter().any(|id| id == business_id)
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for attribution in &self.attributions {
            match &attribution.click_id {
                Some(click) => write!(f, "; {} -> {}", attribution.page_view_id, click)?,
                None => write!(f, "; {} -> none", attribution.page_view_id)?,
            }
        }
        for id in &self.dropped_late {
            write!(f, "; {id} dropped late")?;
        }
        for (counter, expectation) in &self.counters {
            match expectation {
                CounterExpectation::Increase(n) => write!(f, "; {counter} += {n}")?,
                CounterExpectation::Exactly(n) => write!(f, "; {counter} = {n}")?,
            }
        }
        Ok(())
    }
}

/// A named, self-contained scenario
#[derive(Debug, Clone)]
pub struct Scenario {
    name: ScenarioName,
    default_base: ScenarioBase,
    generate: ScenarioFn,
    expectation: Expectation,
}

impl Scenario {
    pub fn new(
        name: &str,
        default_base: ScenarioBase,
        generate: ScenarioFn,
        expectation: Expectation,
    ) -> Result<Self> {
        Ok(Self {
            name: ScenarioName::try_new(name.to_string())
                .map_err(|e| Error::invalid_event("scenario name", e))?,
            default_base,
            generate,
            expectation,
        })
    }

    pub fn name(&self) -> &ScenarioName {
        &self.name
    }

    pub fn default_base(&self) -> ScenarioBase {
        self.default_base
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Events anchored at `base`, in authoring order.
    pub fn events(&self, base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
        (self.generate)(base)
    }

    pub fn default_events(&self) -> Result<Vec<ScheduledEvent>> {
        self.events(&self.default_base)
    }
}
