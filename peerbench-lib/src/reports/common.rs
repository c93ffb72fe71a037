//! Common utilities shared across report generators.

use crate::bench::ItemOutcome;
use crate::metrics::{Catalog, MetricUnit};

/// Format a metric value in its unit, or plainly when the unit is unknown.
pub fn format_value(value: f64, unit: Option<MetricUnit>) -> String {
    unit.map_or_else(|| format!("{value:.2}"), |unit| unit.format(value))
}

/// Format a signed delta in the metric's unit.
pub fn format_delta(delta: f64, unit: Option<MetricUnit>) -> String {
    let sign = if delta >= 0.0 { "+" } else { "-" };
    format!("{sign}{}", format_value(delta.abs(), unit))
}

pub fn format_percentile(percentile: f64) -> String {
    format!("p{percentile:.1}")
}

/// Short status label for one batch item.
pub const fn format_outcome_status(outcome: &ItemOutcome) -> &'static str {
    match outcome {
        ItemOutcome::Completed { from_cache: true, .. } => "CACHED",
        ItemOutcome::Completed { from_cache: false, .. } => "OK",
        ItemOutcome::Invalid(_) => "INVALID",
        ItemOutcome::Failed(_) => "FAILED",
    }
}

/// Look up a metric's unit in an optional catalog.
pub fn unit_of(catalog: Option<&Catalog>, metric_id: &str) -> Option<MetricUnit> {
    catalog.and_then(|c| c.definition(metric_id)).map(|d| d.unit)
}
