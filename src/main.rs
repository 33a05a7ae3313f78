use anyhow::{Context, Result};
use clap::Parser;
use clickstream_harness::application::{Application, RunRequest};
use clickstream_harness::config::Settings;
use clickstream_harness::domain::types::ScenarioBase;
use clickstream_harness::infrastructure::log_messages::configuration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clickstream-harness")]
#[command(about = "Replays page-view and ad-click scenarios into Kafka")]
#[command(version)]
struct Cli {
    /// Scenarios to replay (repeatable or comma-separated)
    #[arg(
        short,
        long = "scenario",
        value_delimiter = ',',
        required_unless_present = "list"
    )]
    scenarios: Vec<String>,

    /// Broker bootstrap servers, overriding configuration
    #[arg(long)]
    bootstrap: Option<String>,

    /// Anchor every scenario at this time (YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_base)]
    base_time: Option<ScenarioBase>,

    /// Print the messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// List available scenarios with their expected outcome and exit
    #[arg(long)]
    list: bool,
}

fn parse_base(value: &str) -> Result<ScenarioBase, String> {
    ScenarioBase::parse(value).map_err(|e| format!("invalid base time '{value}': {e}"))
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    // stdout is reserved for listings and dry-run output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::new().context("loading configuration")?;
    init_tracing(&settings);
    info!("{}", configuration::LOADED);

    if let Some(bootstrap) = cli.bootstrap {
        info!(%bootstrap, "{}", configuration::BOOTSTRAP_OVERRIDE);
        settings.kafka.bootstrap_servers = bootstrap;
    }
    if let Some(base) = cli.base_time {
        settings.scenario.base_time = Some(base.into_inner());
    }

    let app = Application::new(settings)?;

    if cli.list {
        for scenario in app.catalog().scenarios() {
            println!("{}\t{}", scenario.name(), scenario.expectation());
        }
        return Ok(());
    }

    let request = RunRequest {
        scenarios: cli.scenarios,
        dry_run: cli.dry_run,
    };
    let outcome = app.run(&request).await?;

    for message in &outcome.recorded {
        println!(
            "{}\t{}\t{}",
            message.topic,
            message.routing_key_lossy(),
            String::from_utf8_lossy(&message.payload)
        );
    }

    Ok(())
}
