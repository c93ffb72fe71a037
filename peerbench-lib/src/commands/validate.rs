use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::expr::{ContextValue, ValidationContext};
use crate::reports::{console, json};
use clap::Parser;
use ohno::app_err;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Metric to validate against
    #[arg(long, value_name = "ID")]
    pub metric: String,

    /// Value to validate; omit to check whether the metric requires one
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub value: Option<f64>,

    /// Extra values visible to custom rules (format: `name=value`, repeatable)
    #[arg(long = "context", value_name = "NAME=VALUE", value_parser = parse_context)]
    pub context: Vec<(String, ContextValue)>,

    /// Emit JSON instead of console output
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

fn parse_context(s: &str) -> core::result::Result<(String, ContextValue), String> {
    let (name, value) = s.split_once('=').ok_or_else(|| format!("expected `name=value`, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{s}'"));
    }

    let Ok(value) = value.trim().parse::<ContextValue>();
    Ok((name.to_string(), value))
}

/// Validate one value and report every violated rule
///
/// Exits with status code 1 when the value is invalid.
pub async fn validate_value<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    let context: ValidationContext = args.context.iter().cloned().collect();

    let result = common.engine(false).validate(args.value, &args.metric, &context).await?;

    let catalog = common.registry.get_definitions(false).await?;
    let metric = catalog
        .definition(&args.metric)
        .ok_or_else(|| app_err!("metric '{}' disappeared from the catalog", args.metric))?;

    let mut report = String::new();
    if args.json {
        json::validation(metric, args.value, &result, &mut report)?;
    } else {
        console::validation(metric, args.value, &result, common.use_colors(), &mut report)?;
    }

    common.emit(&report);

    if !result.is_valid {
        common.exit(1);
    }

    Ok(())
}
