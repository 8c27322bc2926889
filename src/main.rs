use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crop_footprint::config::DEFAULT_CONFIG_PATH;
use crop_footprint::{load_config, logging, pipeline, writer};

#[derive(Parser)]
#[command(name = "crop-footprint")]
#[command(about = "Per-country biodiversity footprint of a crop commodity")]
struct Cli {
    /// TOML configuration file; FOOTPRINT__* variables override its keys
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Load .env file into std::env
    dotenvy::dotenv().ok();

    let config_path = Cli::parse().config;
    let cfg = load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    let _guard = logging::init(cfg.logging.dir.as_deref());

    let report = pipeline::run(&cfg).context("footprint pipeline failed")?;
    let path = writer::write_report(&report.records, &cfg).context("writing report")?;

    for ranking in &report.rankings {
        let top: Vec<String> = ranking
            .entries
            .iter()
            .map(|e| format!("{}={}", e.label, e.value))
            .collect();
        info!(metric = %ranking.metric, top = ?top, "ranking");
    }

    println!("Wrote {} rows to {}", report.records.len(), path.display());
    Ok(())
}
