//! E-Ink Panel Control Tool
//!
//! CLI for uploading framebuffers to a CC2530 e-paper controller over serial.

mod config;
mod convert;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eink_panel_hw::{EpdDevice, LinkSettings};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "einkctl")]
#[command(about = "Control tool for serial e-paper display controllers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(long)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the display
    Clear,
    /// Upload a framebuffer to controller RAM without refreshing
    Send {
        /// Raw framebuffer file (2756 bytes)
        file: PathBuf,
    },
    /// Push the framebuffer in controller RAM to the display
    Write,
    /// Upload a framebuffer and refresh the display
    Show {
        /// Raw framebuffer file (2756 bytes)
        file: PathBuf,
    },
    /// Convert an image to a raw framebuffer file
    Convert {
        /// Input image (PNG, BMP, JPEG, ...)
        input: PathBuf,

        /// Output framebuffer file
        output: PathBuf,

        /// Luminance below this becomes black
        #[arg(long, default_value = "128")]
        threshold: u8,

        /// Invert black and white
        #[arg(long)]
        invert: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = link_settings(&cli)?;

    match cli.command {
        Commands::Clear => {
            let mut device = open_device(&settings)?;
            device.clear()?;
            println!("Display cleared");
        }
        Commands::Send { file } => {
            let framebuffer = read_framebuffer(&file)?;
            let mut device = open_device(&settings)?;
            device.send(&framebuffer)?;
            println!("Framebuffer uploaded: {}", file.display());
        }
        Commands::Write => {
            let mut device = open_device(&settings)?;
            device.write()?;
            println!("Display updated");
        }
        Commands::Show { file } => {
            let framebuffer = read_framebuffer(&file)?;
            let mut device = open_device(&settings)?;
            device.show(&framebuffer)?;
            println!("Display updated: {}", file.display());
        }
        Commands::Convert {
            input,
            output,
            threshold,
            invert,
        } => {
            let framebuffer = convert::load_image(&input, threshold, invert)?;
            std::fs::write(&output, framebuffer.as_bytes())
                .context("Failed to write framebuffer file")?;
            println!("Framebuffer written to: {}", output.display());
        }
    }

    Ok(())
}

/// Resolves link settings from the config file and command-line overrides.
fn link_settings(cli: &Cli) -> Result<LinkSettings> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(port) = &cli.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    config.validate()?;

    Ok(config.link_settings())
}

fn open_device(settings: &LinkSettings) -> Result<EpdDevice> {
    EpdDevice::open(settings)
        .with_context(|| format!("Failed to open display controller on {}", settings.port))
}

fn read_framebuffer(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
