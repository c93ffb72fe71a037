use crate::Result;
use crate::bench::EngineConfig;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "peerbench.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How long the definition catalog is cached
    #[serde(default = "default_definition_ttl", with = "humantime_serde")]
    pub definition_ttl: Duration,

    /// How long calculation results are cached
    #[serde(default = "default_result_ttl", with = "humantime_serde")]
    pub result_ttl: Duration,

    /// How long peer distributions used for comparisons are cached
    #[serde(default = "default_distribution_ttl", with = "humantime_serde")]
    pub distribution_ttl: Duration,

    /// Interval between sweeps of expired cache entries
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Upper bound on each provider call
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Requests fetched concurrently per wave
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fraction of a range's width treated as near a bound
    #[serde(default = "default_warning_band")]
    pub warning_band: f64,

    /// Base URL of the benchmark service
    #[serde(default)]
    pub provider_url: Option<String>,

    /// JSON fixtures file used instead of a benchmark service
    #[serde(default)]
    pub fixtures: Option<Utf8PathBuf>,
}

const fn default_definition_ttl() -> Duration {
    Duration::from_mins(10)
}

const fn default_result_ttl() -> Duration {
    Duration::from_mins(2)
}

const fn default_distribution_ttl() -> Duration {
    Duration::from_mins(5)
}

const fn default_sweep_interval() -> Duration {
    Duration::from_mins(1)
}

const fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_batch_size() -> usize {
    10
}

const fn default_warning_band() -> f64 {
    0.1
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `peerbench.toml` in `base_dir` is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading peerbench configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading peerbench configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or the TTLs are inconsistent
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(app_err!("batch_size must be at least 1"));
        }

        if !(0.0..=0.5).contains(&self.warning_band) {
            return Err(app_err!("warning_band must be between 0 and 0.5, got {}", self.warning_band));
        }

        if self.fetch_timeout.is_zero() {
            return Err(app_err!("fetch_timeout must be greater than zero"));
        }

        if self.sweep_interval.is_zero() {
            return Err(app_err!("sweep_interval must be greater than zero"));
        }

        if self.result_ttl >= self.definition_ttl {
            return Err(app_err!(
                "result_ttl ({:?}) must be shorter than definition_ttl ({:?})",
                self.result_ttl,
                self.definition_ttl
            ));
        }

        Ok(())
    }

    /// Settings for the calculation engine
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            batch_size: self.batch_size,
            result_ttl: self.result_ttl,
            fetch_timeout: self.fetch_timeout,
            sweep_interval: self.sweep_interval,
            warning_band: self.warning_band,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
