use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::bench::CalculationRequest;
use crate::reports::{console, json};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::IntoAppError;
use std::fs;

const LOG_TARGET: &str = "     batch";

#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// JSON file holding an array of calculation requests
    #[arg(value_name = "REQUESTS")]
    pub requests: Utf8PathBuf,

    /// Retry items that failed at a provider once before reporting
    #[arg(long)]
    pub retry: bool,

    /// Emit JSON instead of console output
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

fn load_requests(path: &Utf8Path) -> Result<Vec<CalculationRequest>> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading requests file '{path}'"))?;
    serde_json::from_str(&text).into_app_err_with(|| format!("parsing requests file '{path}'"))
}

/// Benchmark every request in a file and report the outcome of each
///
/// Exits with status code 1 unless every request completed.
pub async fn process_batch<H: Host>(host: &mut H, args: &BatchArgs) -> Result<()> {
    let requests = load_requests(&args.requests)?;
    let mut common = Common::new(host, &args.common)?;
    let engine = common.engine(!args.json);

    let mut outcome = engine.calculate_batch(requests).await?;

    if args.retry && outcome.items.iter().any(|item| item.outcome.error().is_some_and(|e| e.is_retriable())) {
        log::info!(target: LOG_TARGET, "Retrying failed requests once");
        outcome = engine.retry_failed(&outcome).await?;
    }

    let mut report = String::new();
    if args.json {
        json::batch(&outcome, &mut report)?;
    } else {
        let catalog = common.registry.get_definitions(false).await.ok();
        console::batch(&outcome, catalog.as_deref(), common.use_colors(), &mut report)?;
    }

    common.emit(&report);

    if !outcome.is_complete() {
        common.exit(1);
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::metrics::Timeframe;

    #[test]
    fn test_load_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from(dir.path().to_string_lossy().to_string()).join("requests.json");
        fs::write(
            &path,
            r#"[
                { "metric_id": "nrr", "value": 130.0, "peer_group_id": "saas-smb", "timeframe": "annual" },
                { "metric_id": "cac_payback", "value": 14, "peer_group_id": "saas-smb", "timeframe": "monthly" }
            ]"#,
        )
        .unwrap();

        let requests = load_requests(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], CalculationRequest::new("cac_payback", 14.0, "saas-smb", Timeframe::Monthly));
    }

    #[test]
    fn test_load_requests_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from(dir.path().to_string_lossy().to_string()).join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_requests(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
