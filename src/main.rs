// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the SaaS login portal
mod config;
mod portal;
mod provider;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use config::Config;

/// Login page for the SaaS starter web application
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Web server port (overrides the configuration file)
    #[arg(short = 'p', long)]
    web_port: Option<u16>,

    /// Web server address (overrides the configuration file)
    #[arg(short = 'a', long)]
    web_address: Option<String>,

    /// Output the embedded configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    let mut config = Config::from_file(&args.config)?;
    config.apply_args(args.web_port, args.web_address);

    log::info!(
        "Starting login portal on {}:{}",
        config.server.address,
        config.server.port
    );

    portal::start(config).await
}
