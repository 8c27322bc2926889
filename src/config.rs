use std::path::{Path, PathBuf};

use config::Config;
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "footprint.toml";
/// Environment variables such as `FOOTPRINT__COMMODITY` override the file.
pub const ENV_PREFIX: &str = "FOOTPRINT";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FootprintConfig {
    /// Value of `item_name` the impact factors are filtered on.
    pub commodity: String,
    /// Reference year of the inputs; only used to name the report.
    pub year: u16,
    pub inputs: InputPaths,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputPaths {
    pub crops: PathBuf,
    pub country_specs: PathBuf,
    pub production: PathBuf,
    pub area: PathBuf,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Parquet,
    Csv,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: ReportFormat,
    /// Entries kept per metric ranking.
    pub top_n: usize,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write a daily rolling log file here instead of stdout.
    pub dir: Option<PathBuf>,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            commodity: "Wheat".to_string(),
            year: 2019,
            inputs: InputPaths::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            crops: PathBuf::from("data/crops.csv"),
            country_specs: PathBuf::from("data/country_specs.csv"),
            production: PathBuf::from("data/production.csv"),
            area: PathBuf::from("data/area.csv"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            format: ReportFormat::Parquet,
            top_n: 10,
        }
    }
}

/// Load the configuration file at `path`, then apply `FOOTPRINT__*`
/// environment overrides. A missing file falls back to the defaults.
pub fn load_config(path: &Path) -> Result<FootprintConfig> {
    let cfg = Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg.try_deserialize()?)
}
