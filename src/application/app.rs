use tracing::{info, instrument};

use crate::config::Settings;
use crate::delivery::{DeliveryScheduler, ReplayPolicy, ReplayReport, Timeline};
use crate::domain::catalog::ScenarioCatalog;
use crate::domain::events::OutboundMessage;
use crate::domain::identifiers::ReplayRunId;
use crate::domain::scenario::Scenario;
use crate::domain::types::ScenarioBase;
use crate::infrastructure::kafka::KafkaSink;
use crate::infrastructure::log_messages::{application as messages, configuration, delivery};
use crate::infrastructure::sink::{EventSink, RecordingSink};
use crate::Result;

/// What to replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub scenarios: Vec<String>,
    /// Record instead of publishing to the broker
    pub dry_run: bool,
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ReplayReport,
    /// Messages captured by a dry run, empty otherwise
    pub recorded: Vec<OutboundMessage>,
}

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    catalog: ScenarioCatalog,
}

impl Application {
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self::with_catalog(settings, ScenarioCatalog::builtin()?))
    }

    pub fn with_catalog(settings: Settings, catalog: ScenarioCatalog) -> Self {
        Self { settings, catalog }
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    fn base_for(&self, scenario: &Scenario) -> ScenarioBase {
        self.settings
            .scenario
            .base_time
            .map(ScenarioBase::new)
            .unwrap_or_else(|| scenario.default_base())
    }

    /// Resolves the requested scenarios and lays them out back-to-back in
    /// selection order. No I/O.
    pub fn plan<S: AsRef<str>>(&self, names: &[S]) -> Result<Timeline> {
        let scenarios = self.catalog.resolve(names)?;
        if let Some(base) = self.settings.scenario.base_time {
            info!(%base, "{}", configuration::BASE_OVERRIDE);
        }

        info!(scenarios = scenarios.len(), "{}", messages::SCENARIOS_RESOLVED);

        let mut sequences = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            info!(
                scenario = %scenario.name(),
                expectation = %scenario.expectation(),
                "{}",
                messages::EXPECTATION
            );
            sequences.push(scenario.events(&self.base_for(scenario))?);
        }

        let timeline = Timeline::compose(sequences);
        info!(events = timeline.len(), "{}", delivery::TIMELINE_BUILT);
        Ok(timeline)
    }

    /// Resolves scenarios before touching the broker, so a typo never
    /// costs a connection attempt.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome> {
        let run_id = ReplayRunId::generate();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));
        info!("{}", messages::STARTING);

        let timeline = self.plan(request.scenarios.as_slice())?;

        let outcome = if request.dry_run {
            info!("{}", messages::DRY_RUN);
            let sink = RecordingSink::new();
            let policy = ReplayPolicy::immediate(self.settings.replay.ack_timeout());
            let report = self.replay_into(sink.clone(), policy, run_id, timeline).await?;
            RunOutcome {
                report,
                recorded: sink.messages(),
            }
        } else {
            let sink = KafkaSink::connect(&self.settings.kafka).await?;
            let policy = ReplayPolicy::from(&self.settings.replay);
            let report = self.replay_into(sink, policy, run_id, timeline).await?;
            RunOutcome {
                report,
                recorded: Vec::new(),
            }
        };

        info!(delivered = outcome.report.delivered(), "{}", messages::FINISHED);
        Ok(outcome)
    }

    /// Replays `timeline` through any sink with the configured topics.
    pub async fn replay_into<S: EventSink>(
        &self,
        sink: S,
        policy: ReplayPolicy,
        run_id: ReplayRunId,
        timeline: Timeline,
    ) -> Result<ReplayReport> {
        DeliveryScheduler::new(sink, self.settings.topics.clone(), policy)
            .replay(run_id, timeline)
            .await
    }
}
