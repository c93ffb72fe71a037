use super::common;
use crate::Result;
use crate::bench::{BatchOutcome, ComparisonResult, ItemOutcome};
use crate::expr::ValidationResult;
use crate::metrics::MetricDefinition;
use core::fmt::Write;
use serde_json::json;

pub fn validation<W: Write>(metric: &MetricDefinition, value: Option<f64>, result: &ValidationResult, writer: &mut W) -> Result<()> {
    let output = json!({
        "metric_id": metric.id,
        "value": value,
        "unit": metric.unit,
        "validation": result,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

pub fn comparison<W: Write>(result: &ComparisonResult, writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(result)?)?;
    Ok(())
}

#[expect(unused_results, reason = "Map::insert on fresh keys never overwrites")]
pub fn batch<W: Write>(outcome: &BatchOutcome, writer: &mut W) -> Result<()> {
    let mut items = Vec::with_capacity(outcome.items.len());

    for item in &outcome.items {
        let mut item_obj = serde_json::Map::new();
        item_obj.insert("request".to_string(), json!(item.request));
        item_obj.insert("state".to_string(), json!(item.outcome.state().to_string()));
        item_obj.insert("status".to_string(), json!(common::format_outcome_status(&item.outcome)));

        match &item.outcome {
            ItemOutcome::Completed { result, from_cache } => {
                item_obj.insert("result".to_string(), json!(result));
                item_obj.insert("from_cache".to_string(), json!(from_cache));
            }
            ItemOutcome::Invalid(validation) => {
                item_obj.insert("validation".to_string(), json!(validation));
            }
            ItemOutcome::Failed(e) => {
                item_obj.insert("error".to_string(), json!(e.to_string()));
                item_obj.insert("retriable".to_string(), json!(e.is_retriable()));
            }
        }

        items.push(json!(item_obj));
    }

    let output = json!({
        "items": items,
        "progress": {
            "completed": outcome.progress.completed,
            "total": outcome.progress.total,
            "waves": outcome.progress.waves,
        },
        "complete": outcome.is_complete(),
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
