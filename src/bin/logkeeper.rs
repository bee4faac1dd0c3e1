use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use logkeeper::{LogMaintenance, MaintenanceConfig, SystemClock};

#[derive(Parser)]
#[command(name = "logkeeper")]
#[command(about = "Delete, compress and archive rotated service logs")]
struct Cli {
    /// Log root containing core/, core/out/ and core/operation_log/
    #[arg(long)]
    base: Option<PathBuf>,

    /// JSON config file (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rotated files kept per bucket
    #[arg(long)]
    retain: Option<usize>,

    /// Archive dated operation-log directories older than this many months
    #[arg(long)]
    archive_months: Option<u32>,

    /// Do not take the advisory maintenance lock
    #[arg(long)]
    no_lock: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Seconds between passes (ignored with --once)
    #[arg(long, default_value_t = 3600)]
    interval_secs: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MaintenanceConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => MaintenanceConfig::default(),
    };
    if let Some(base) = cli.base {
        config.base_dir = base;
    }
    if let Some(retain) = cli.retain {
        config.retain_count = retain;
    }
    if let Some(months) = cli.archive_months {
        config.archive_after_months = months;
    }
    if cli.no_lock {
        config.lock = false;
    }
    config.validate().context("invalid configuration")?;

    info!("Log root: {}", config.base_dir.display());
    let maintenance = LogMaintenance::new(config, SystemClock);
    if cli.once {
        maintenance.run_once();
        return Ok(());
    }

    maintenance.run_loop(Duration::from_secs(cli.interval_secs))
}
