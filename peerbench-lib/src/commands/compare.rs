use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::reports::{console, json};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Metric the value belongs to
    #[arg(long, value_name = "ID")]
    pub metric: String,

    /// Value to rank within the peer group
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub value: f64,

    /// Peer group to compare against
    #[arg(long, value_name = "GROUP")]
    pub peer_group: String,

    /// Emit JSON instead of console output
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Rank a single value within its peer group's distribution
pub async fn compare_value<H: Host>(host: &mut H, args: &CompareArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;

    let result = common.comparison().compare(args.value, &args.metric, &args.peer_group).await?;

    let mut report = String::new();
    if args.json {
        json::comparison(&result, &mut report)?;
    } else {
        let catalog = common.registry.get_definitions(false).await?;
        let unit = catalog.definition(&args.metric).map(|d| d.unit);
        console::comparison(&result, unit, common.use_colors(), &mut report)?;
    }

    common.emit(&report);
    Ok(())
}
