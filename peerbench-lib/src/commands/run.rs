//! Command dispatch logic for peerbench

use super::{BatchArgs, CompareArgs, InitArgs, ValidateArgs, compare_value, init_config, process_batch, validate_value};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "peerbench", version, author, long_about = None)]
#[command(about = "Validate business metrics and benchmark them against peer groups")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a metric value against the metric's validation rules
    Validate(Box<ValidateArgs>),
    /// Rank a metric value within a peer group
    Compare(Box<CompareArgs>),
    /// Validate and benchmark a file of requests
    Batch(Box<BatchArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match Cli::parse_from(args).command {
        Command::Validate(validate_args) => validate_value(host, &validate_args).await,
        Command::Compare(compare_args) => compare_value(host, &compare_args).await,
        Command::Batch(batch_args) => process_batch(host, &batch_args).await,
        Command::Init(init_args) => init_config(host, &init_args),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_repeated_context() {
        let cli = Cli::try_parse_from([
            "peerbench",
            "validate",
            "--metric",
            "nrr",
            "--value",
            "-5",
            "--context",
            "enterprise=true",
            "--context",
            "seats=40",
            "--fixtures",
            "fixtures.json",
        ])
        .unwrap();

        let Command::Validate(args) = cli.command else {
            panic!("expected the validate command");
        };
        assert_eq!(args.value, Some(-5.0));
        assert_eq!(args.context.len(), 2);
        assert_eq!(args.common.fixtures.as_deref().map(camino::Utf8Path::as_str), Some("fixtures.json"));
    }

    #[test]
    fn test_compare_requires_peer_group() {
        let err = Cli::try_parse_from(["peerbench", "compare", "--metric", "nrr", "--value", "1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
