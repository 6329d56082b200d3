//! iconsmith - normalize vendor cloud icon archives into a searchable catalog.

#![allow(dead_code)]

mod archive;
mod catalog;
mod cli;
mod config;
mod icon;
mod logger;
mod pipeline;
mod provider;
mod svg;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let mut config = PipelineConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Build { build_args } => {
            cli::build::build_icons(&mut config, build_args).map(|_| ())
        }
        Commands::Clean => cli::clean::clean_output(&config).map(|_| ()),
        Commands::Providers => cli::providers::list_providers(&config),
    }
}
