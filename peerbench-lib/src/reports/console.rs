use super::common;
use crate::Result;
use crate::bench::{BatchOutcome, ComparisonResult, ItemOutcome, ItemState};
use crate::expr::ValidationResult;
use crate::metrics::{Catalog, MetricDefinition, MetricUnit};
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn validation<W: Write>(
    metric: &MetricDefinition,
    value: Option<f64>,
    result: &ValidationResult,
    use_colors: bool,
    writer: &mut W,
) -> Result<()> {
    let value_str = value.map_or_else(|| "n/a".to_string(), |v| metric.unit.format(v));
    let status = if result.is_valid { "VALID" } else { "INVALID" };
    let colored_status = if !use_colors {
        status.to_string()
    } else if result.is_valid {
        status.green().bold().to_string()
    } else {
        status.red().bold().to_string()
    };

    writeln!(writer, "{} ({}) = {value_str} is {colored_status}", metric.name, metric.id)?;

    for error in &result.errors {
        writeln!(writer, "  🗙 [{}, priority {}] {}", error.rule, error.priority, error.message)?;
    }

    for warning in &result.warnings {
        if use_colors {
            writeln!(writer, "  ⚠ {}", warning.message.yellow())?;
        } else {
            writeln!(writer, "  ⚠ {}", warning.message)?;
        }
    }

    Ok(())
}

pub fn comparison<W: Write>(result: &ComparisonResult, unit: Option<MetricUnit>, use_colors: bool, writer: &mut W) -> Result<()> {
    let percentile = common::format_percentile(result.percentile);
    let percentile = if use_colors {
        percentile.cyan().bold().to_string()
    } else {
        percentile
    };

    writeln!(
        writer,
        "{} = {} in peer group '{}' ranks at {percentile}",
        result.metric_id,
        common::format_value(result.value, unit),
        result.peer_group_id
    )?;

    for bracket in result.distribution.brackets() {
        writeln!(
            writer,
            "  p{:<3} : {}",
            bracket.percentile,
            common::format_value(bracket.value, unit)
        )?;
    }

    let source = if result.distribution.source.is_empty() {
        "unknown source"
    } else {
        result.distribution.source.as_str()
    };
    let cached = if result.from_cache { ", cached" } else { "" };
    writeln!(
        writer,
        "  ({source}, collected {}{cached})",
        result.distribution.collected_at.format("%Y-%m-%d")
    )?;

    Ok(())
}

pub fn batch<W: Write>(outcome: &BatchOutcome, catalog: Option<&Catalog>, use_colors: bool, writer: &mut W) -> Result<()> {
    let rows: Vec<[String; 6]> = outcome
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let unit = common::unit_of(catalog, &item.request.metric_id);
            let (percentile, detail) = match &item.outcome {
                ItemOutcome::Completed { result, .. } => (
                    common::format_percentile(result.percentile),
                    match (result.calculated_value, result.trend.change()) {
                        (Some(delta), Some(change)) => format!(
                            "{} vs latest trend, trend {}",
                            common::format_delta(delta, unit),
                            common::format_delta(change, unit)
                        ),
                        (Some(delta), None) => format!("{} vs latest trend", common::format_delta(delta, unit)),
                        (None, _) => String::new(),
                    },
                ),
                ItemOutcome::Invalid(validation) => (String::new(), validation.messages().collect::<Vec<_>>().join("; ")),
                ItemOutcome::Failed(e) => (String::new(), e.to_string()),
            };

            [
                (index + 1).to_string(),
                item.request.metric_id.clone(),
                item.request.peer_group_id.clone(),
                common::format_value(item.request.value, unit),
                percentile,
                detail,
            ]
        })
        .collect();

    let headers = ["#", "Metric", "Peer group", "Value", "Rank", "Detail"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let status_width = "STATUS".len().max("INVALID".len());

    let header_line = format!(
        "{:>w0$}  {:<w1$}  {:<w2$}  {:>w3$}  {:<status_width$}  {:>w4$}  {}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        "Status",
        headers[4],
        headers[5],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
        w4 = widths[4],
    );

    if use_colors {
        writeln!(writer, "{}", header_line.trim_end().bold())?;
    } else {
        writeln!(writer, "{}", header_line.trim_end())?;
    }

    for (row, item) in rows.iter().zip(&outcome.items) {
        let status = common::format_outcome_status(&item.outcome);
        let padded = format!("{status:<status_width$}");
        let status = if use_colors {
            match item.outcome.state() {
                ItemState::Completed => padded.green().to_string(),
                ItemState::Invalid => padded.yellow().to_string(),
                _ => padded.red().to_string(),
            }
        } else {
            padded
        };

        let line = format!(
            "{:>w0$}  {:<w1$}  {:<w2$}  {:>w3$}  {status}  {:>w4$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            row[4],
            row[5],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
            w4 = widths[4],
        );
        writeln!(writer, "{}", line.trim_end())?;
    }

    let cached = outcome
        .items
        .iter()
        .filter(|item| matches!(item.outcome, ItemOutcome::Completed { from_cache: true, .. }))
        .count();

    writeln!(writer)?;
    writeln!(
        writer,
        "{} requests: {} completed ({cached} cached), {} invalid, {} failed, {} fetch waves",
        outcome.items.len(),
        outcome.count(ItemState::Completed),
        outcome.count(ItemState::Invalid),
        outcome.count(ItemState::Failed),
        outcome.progress.waves
    )?;

    Ok(())
}
