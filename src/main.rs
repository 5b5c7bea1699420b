// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the teleinfo acquisition daemon
use anyhow::Result;
use clap::Parser;
use log::info;
use rust_teleinfo::config::{self, Config, SourceKind};
use rust_teleinfo::daemon::Daemon;

use std::path::PathBuf;
use tokio::signal;

/// Teleinfo electricity meter acquisition daemon
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Serial device the meter is connected to
    #[arg(short = 's', long = "serial")]
    serial_device: Option<String>,

    /// SQLite database receiving the records
    #[arg(short = 'b', long = "db")]
    database: Option<PathBuf>,

    /// Aggregation interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Source of the teleinfo stream
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Raw teleinfo capture to replay
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    info!(
        "{} {} starting",
        env!("CARGO_BIN_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::from_file(&args.config)?;
    config.apply_args(
        args.serial_device,
        args.database,
        args.interval,
        args.source,
        args.input_file,
    );
    config.validate()?;

    let mut daemon = Daemon::new();
    daemon.launch(&config)?;

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, terminating daemon"),
        Err(err) => eprintln!("Error waiting for shutdown signal: {}", err),
    }
    daemon.shutdown();
    daemon.join().await?;

    info!("{} stopped", env!("CARGO_BIN_NAME"));
    Ok(())
}
