//! Built-in scenarios
//!
//! Adding an edge case means writing a producer and its expectation in one
//! of the submodules and listing it here. Nothing in the scheduler changes.

pub mod attribution;
pub mod engine_metrics;

use crate::domain::scenario::Scenario;
use crate::domain::types::ScenarioBase;
use crate::error::{Error, Result};

/// Default base of the attribution edge cases
pub const ATTRIBUTION_BASE: &str = "2024-01-01T12:00:00";

/// Default base of the engine metrics scenarios
pub const ENGINE_METRICS_BASE: &str = "2026-01-01T12:00:00";

/// Selection that expands to every attribution edge case
pub const GENERATOR_SUITE: &str = "generator_suite";

/// Members of [`GENERATOR_SUITE`], in listing order
pub const GENERATOR_SUITE_MEMBERS: &[&str] = &[
    "on_time_attribution",
    "out_of_order_in_window",
    "latest_click_wins",
    "click_outside_window",
    "click_beyond_allowed_lateness",
    "no_candidate_click",
];

fn base(value: &str) -> Result<ScenarioBase> {
    ScenarioBase::parse(value).map_err(|e| Error::invalid_event("scenario base", e))
}

/// Every scenario shipped with the harness.
pub fn builtin() -> Result<Vec<Scenario>> {
    let attribution_base = base(ATTRIBUTION_BASE)?;
    let metrics_base = base(ENGINE_METRICS_BASE)?;

    Ok(vec![
        Scenario::new(
            "on_time_attribution",
            attribution_base,
            attribution::on_time_attribution,
            attribution::on_time_attribution_expectation(),
        )?,
        Scenario::new(
            "out_of_order_in_window",
            attribution_base,
            attribution::out_of_order_in_window,
            attribution::out_of_order_in_window_expectation(),
        )?,
        Scenario::new(
            "latest_click_wins",
            attribution_base,
            attribution::latest_click_wins,
            attribution::latest_click_wins_expectation(),
        )?,
        Scenario::new(
            "click_outside_window",
            attribution_base,
            attribution::click_outside_window,
            attribution::click_outside_window_expectation(),
        )?,
        Scenario::new(
            "click_beyond_allowed_lateness",
            attribution_base,
            attribution::click_beyond_allowed_lateness,
            attribution::click_beyond_allowed_lateness_expectation(),
        )?,
        Scenario::new(
            "no_candidate_click",
            attribution_base,
            attribution::no_candidate_click,
            attribution::no_candidate_click_expectation(),
        )?,
        Scenario::new(
            "two_clicks_then_pageview",
            metrics_base,
            engine_metrics::two_clicks_then_pageview,
            engine_metrics::two_clicks_then_pageview_expectation(),
        )?,
        Scenario::new(
            "pageview_then_two_clicks",
            metrics_base,
            engine_metrics::pageview_then_two_clicks,
            engine_metrics::pageview_then_two_clicks_expectation(),
        )?,
        Scenario::new(
            "late_click_dropped",
            metrics_base,
            engine_metrics::late_click_dropped,
            engine_metrics::late_click_dropped_expectation(),
        )?,
        Scenario::new(
            "late_pageview_dropped",
            metrics_base,
            engine_metrics::late_pageview_dropped,
            engine_metrics::late_pageview_dropped_expectation(),
        )?,
        Scenario::new(
            "metrics_reference",
            metrics_base,
            engine_metrics::metrics_reference,
            engine_metrics::metrics_reference_expectation(),
        )?,
    ])
}
