//! # Fleet Configuration Validator
//!
//! Command-line tool for checking the layered fleet configuration for an
//! environment before starting the orchestrator.

use clap::Parser;
use fleet_orchestrator::config::ConfigManager;
use std::path::PathBuf;
use std::process;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fleet-config-validator")]
#[command(about = "Validate fleet orchestrator configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment overlay to apply (development, test, production, sitl, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let manager = match ConfigManager::load_from_directory_with_env(cli.config_dir, &cli.environment)
    {
        Ok(manager) => manager,
        Err(e) => {
            error!("Configuration invalid: {e}");
            eprintln!("❌ {e}");
            process::exit(1);
        }
    };
    let config = manager.config();

    match cli.format.as_str() {
        "json" => match serde_json::to_string_pretty(config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Failed to render configuration: {e}");
                process::exit(1);
            }
        },
        _ => {
            println!("✅ Configuration valid for environment '{}'", manager.environment());
            println!("   directory          {}", manager.config_directory().display());
            let orchestration = &config.orchestration;
            println!("   jitter window      {} ms", orchestration.jitter_window_ms);
            println!("   stage timeout      {} ms", orchestration.stage_timeout_ms);
            println!("   guided mode        {}", orchestration.guided_mode);
            println!("   force arm          {}", orchestration.force_arm);
            for (stage, policy) in orchestration.stage_policies() {
                println!(
                    "   {:<18} required={} settle={:?}",
                    stage.as_str(),
                    policy.required,
                    policy.settle
                );
            }
            println!(
                "   altitude range     ({}, {}] m",
                config.validation.min_altitude_m, config.validation.max_altitude_m
            );
            println!("   command buffer     {}", config.messaging.command_buffer_size);
        }
    }
}
