//! fbcast device process entry point.
//!
//! ```text
//! fbcast-device <display> <width> <height>     Run against a display
//! fbcast-device --config <path> …              Load a custom config TOML
//! fbcast-device --gen-config                   Write default config to stdout
//! ```
//!
//! The process speaks the snapshot protocol on stdin/stdout: the
//! capability packet goes out first, then the driver answers host
//! commands until stdin reaches end-of-stream. All logging goes to
//! stderr; stdout belongs to the wire.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fbcast_core::{CaptureProvider, Driver};
use fbcast_device::config::DeviceConfig;
use fbcast_device::pattern::PatternBackend;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fbcast-device", about = "fbcast framebuffer snapshot streamer")]
struct Cli {
    /// Display device to capture.
    display: u32,

    /// Requested capture width in pixels.
    width: u32,

    /// Requested capture height in pixels.
    height: u32,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "fbcast-device.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&DeviceConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let config = DeviceConfig::load(&cli.config);

    // Init tracing. Stderr only: stdout carries the packet stream.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("fbcast-device v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "display {}: requested capture {}x{}",
        cli.display, cli.width, cli.height
    );

    // A failed backend initialisation is fatal before anything is
    // emitted; the supervisor sees the nonzero exit.
    let backend = PatternBackend::new(cli.display, cli.width, cli.height)?;
    let capture = backend.info();
    info!(
        "backend ready: capture {}x{} (stride {})",
        capture.capture_width, capture.capture_height, capture.capture_stride
    );

    let driver = Driver::with_state(
        backend,
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.to_capture_state(),
    );
    driver.run().await?;

    info!("host closed the stream; exiting");
    Ok(())
}
