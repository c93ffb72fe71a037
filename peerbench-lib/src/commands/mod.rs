//! Command-line interface and orchestration for peerbench
//!
//! This module implements the CLI commands on top of the calculation engine,
//! the comparison service, and the report generators.
//!
//! # Commands
//!
//! - **validate**: Check one value against a metric's rules, with optional
//!   named context values for custom rules
//! - **compare**: Rank one value within a peer group's distribution
//! - **batch**: Validate and benchmark a JSON file of requests in waves,
//!   optionally retrying provider failures once
//! - **init**: Generate a default configuration file
//!
//! The `run` function parses arguments with clap and routes to a handler.
//! Every provider-backed command starts a `Common` session that loads the
//! configuration, sets up logging, and selects an HTTP or fixtures provider.
//! Output goes through the `Host` trait so commands can run under test.

mod batch;
mod common;
mod compare;
mod config;
mod host;
mod init;
mod progress_reporter;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use batch::{BatchArgs, process_batch};
pub use compare::{CompareArgs, compare_value};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use validate::{ValidateArgs, validate_value};
