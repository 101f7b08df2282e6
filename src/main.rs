//! Launchpad S demo
//!
//! Reaction game, event monitor and port listing for the Novation Launchpad S.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use launchpad_s::transport::system::discovery;
use launchpad_s::Launchpad;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod game;
mod monitor;

use crate::config::AppConfig;

/// Launchpad S - Reaction game and event monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "launchpad.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Device address, overrides the configuration file
    #[arg(short, long, env = "LAUNCHPAD_DEVICE")]
    device: Option<String>,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print button events instead of running the game
    #[arg(long)]
    monitor: bool,

    /// Save the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        list_ports_formatted();
        return Ok(());
    }

    info!("Configuration file: {}", args.config);
    let mut config = AppConfig::load_or_default(&args.config).await?;
    if let Some(device) = args.device {
        config.device.address = device;
    }

    if args.write_config {
        config.save(&args.config).await?;
        println!("{} {}", "Configuration written to".green(), args.config);
        return Ok(());
    }

    if args.monitor {
        let lp = Launchpad::open(&config.device.address, config.device.nonblocking)
            .with_context(|| format!("Failed to open Launchpad at {}", config.device.address))?;
        info!("Connected to {}", config.device.address);
        return monitor::run(lp, shutdown_signal()).await;
    }

    // The game loop polls between frames
    if !config.device.nonblocking {
        warn!("device.nonblocking is false; the game always opens the device non-blocking");
    }
    let mut lp = Launchpad::open(&config.device.address, true)
        .with_context(|| format!("Failed to open Launchpad at {}", config.device.address))?;
    info!("Connected to {}", config.device.address);

    lp.reset().context("Failed to reset Launchpad")?;
    let score = game::play(&mut lp, &config.demo, shutdown_signal()).await?;
    info!("Game over, score {}", score);

    lp.close().context("Failed to close Launchpad")?;
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// List all ports in a formatted way
fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    let sections = [
        ("Input Ports:", discovery::discover_input_ports()),
        ("Output Ports:", discovery::discover_output_ports()),
    ];

    for (title, ports) in sections {
        println!("\n{}", title.bold());
        match ports {
            Ok(ports) if ports.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(ports) => {
                for port in ports {
                    let marker = if port.is_launchpad {
                        "[LAUNCHPAD]".green()
                    } else {
                        "[OTHER]    ".dimmed()
                    };
                    println!("  {} {:>2}: {}", marker, port.index, port.name);
                }
            }
            Err(e) => println!("  {}", format!("Port discovery failed: {}", e).red()),
        }
    }

    if let Some(name) = discovery::find_launchpad() {
        println!("\n{}", "Auto-detected Launchpad:".bold().bright_green());
        println!("  {}", name.bright_white());
    }

    println!();
}
