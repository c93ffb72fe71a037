//! Session setup shared by every command that talks to a provider.

use super::config::Config;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::bench::{CalculationEngine, ComparisonService};
use crate::facts::providers::{FixtureProvider, HttpProvider, Provider};
use crate::metrics::DefinitionRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use core::time::Duration;
use ohno::bail;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "   session";

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by the validate, compare, and batch commands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (default is `peerbench.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Base URL of the benchmark service, overriding the configuration
    #[arg(long, value_name = "URL", env = "PEERBENCH_PROVIDER_URL")]
    pub provider_url: Option<String>,

    /// JSON fixtures file to serve definitions and benchmarks from, overriding the configuration
    #[arg(long, value_name = "PATH")]
    pub fixtures: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

type SharedProvider = Arc<Provider>;

/// A configured session: settings, the provider, and the definition registry built on it.
pub struct Common<'a, H: Host> {
    pub config: Config,
    pub registry: Arc<DefinitionRegistry<SharedProvider>>,
    provider: SharedProvider,
    host: &'a mut H,
    color: ColorMode,
    log_level: LogLevel,
}

impl<'a, H: Host> Common<'a, H> {
    /// Initialize logging, load the configuration and connect to the provider
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no provider can be set up
    pub fn new(host: &'a mut H, args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        let provider = Arc::new(resolve_provider(&config, args)?);
        let registry = Arc::new(DefinitionRegistry::new(Arc::clone(&provider), config.definition_ttl));

        Ok(Self {
            config,
            registry,
            provider,
            host,
            color: args.color,
            log_level: args.log_level,
        })
    }

    /// A calculation engine over this session's provider.
    ///
    /// With `show_progress`, a delayed progress bar tracks batch runs.
    pub fn engine(&self, show_progress: bool) -> CalculationEngine<SharedProvider, SharedProvider> {
        let engine = CalculationEngine::new(Arc::clone(&self.registry), Arc::clone(&self.provider), self.config.engine_config());

        if show_progress {
            let delay = if self.log_level == LogLevel::None {
                Duration::from_millis(300)
            } else {
                Duration::from_hours(365 * 24)
            };

            engine.with_progress(Arc::new(ProgressReporter::new(delay, self.use_colors_for_progress())))
        } else {
            engine
        }
    }

    pub fn comparison(&self) -> ComparisonService<SharedProvider, SharedProvider> {
        ComparisonService::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.provider),
            self.config.distribution_ttl,
            self.config.fetch_timeout,
        )
    }

    /// Whether report output should carry ANSI colors.
    pub fn use_colors(&self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stdout};
                stdout().is_terminal()
            }
        }
    }

    fn use_colors_for_progress(&self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stderr};
                stderr().is_terminal()
            }
        }
    }

    /// Write a rendered report to the host's output, ending it with a newline.
    pub fn emit(&mut self, report: &str) {
        if report.ends_with('\n') {
            let _ = write!(self.host.output(), "{report}");
        } else {
            let _ = writeln!(self.host.output(), "{report}");
        }
    }

    pub fn exit(&mut self, code: i32) {
        self.host.exit(code);
    }
}

/// Pick the provider: fixtures win over a service URL, and command line flags over the configuration.
fn resolve_provider(config: &Config, args: &CommonArgs) -> Result<Provider> {
    if let Some(path) = args.fixtures.as_ref().or(config.fixtures.as_ref()) {
        log::info!(target: LOG_TARGET, "Serving benchmarks from fixtures file '{path}'");
        return Ok(Provider::Fixture(FixtureProvider::load(path)?));
    }

    if let Some(url) = args.provider_url.as_deref().or(config.provider_url.as_deref()) {
        log::info!(target: LOG_TARGET, "Using benchmark service at '{url}'");
        return Ok(Provider::Http(HttpProvider::new(url)?));
    }

    bail!("no benchmark provider configured: pass --provider-url or --fixtures, or set `provider_url` or `fixtures` in peerbench.toml")
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when several commands run in one process.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
