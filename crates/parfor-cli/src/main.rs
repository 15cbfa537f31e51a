#![doc = include_str!("../README.md")]

mod config;
mod telemetry;
mod workload;

use clap::Parser;
use config::{CliArgs, RunConfig};
use telemetry::init_telemetry;

// Using mimalloc to keep allocation out of the way of the measured loop,
// especially in musl environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    workload::run(&config)
}

fn log_startup_info(config: &RunConfig) {
    tracing::info!(
        scheduler = ?config.scheduler,
        threads = config.threads,
        mode = ?config.mode,
        count = config.count,
        min_step = config.min_step,
        repeat = config.repeat,
        fail_at = ?config.fail_at,
        "starting parfor workload"
    );
}
