// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use image_classifier::{cli::Cli, run, ClassifierConfig, ClassifyError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let cli = Cli::parse();

    let result = ClassifierConfig::from_cli(&cli)
        .map_err(ClassifyError::from)
        .and_then(|config| {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            run(&config, &mut out)
        });

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
