//! usb-install Server
//!
//! Serves application package files (.nsp / .xci) to a USB-attached peer.
//! The host announces a catalog of files, then answers file range commands
//! with chunked bulk transfers until the peer sends EXIT.

mod catalog;
mod config;
mod session;
mod usb;

use anyhow::{Context, Result, anyhow, bail};
use catalog::{Catalog, build_catalog};
use clap::Parser;
use common::setup_logging;
use protocol::TransferConfig;
use session::{SessionSummary, serve_session};
use tokio::signal;
use tokio::sync::oneshot;
use tracing::info;
use usb::{UsbLink, find_device, resolve_endpoints};

#[derive(Parser, Debug)]
#[command(name = "usb-install-server")]
#[command(
    author,
    version,
    about = "USB install server - Serve .nsp/.xci packages to a USB-attached peer"
)]
#[command(long_about = "
Announces a catalog of package files to a USB-attached peer and streams the
byte ranges it requests over bulk transfers.

EXAMPLES:
    # Serve two packages
    usb-install-server ./game.nsp ./update.xci

    # Serve the files listed in a config file
    usb-install-server --config /path/to/config.toml

    # Run with debug logging
    usb-install-server --log-level debug ./game.nsp

CONFIGURATION:
    The server looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/usb-install/server.toml
    3. /etc/usb-install/server.toml
    4. Built-in defaults
")]
struct Args {
    /// Package files to offer, after any listed in the config file
    #[arg(value_name = "FILES")]
    files: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Which device to open, resolved from the configuration
#[derive(Debug, Clone, Copy)]
struct UsbTarget {
    vendor_id: u16,
    product_id: u16,
    interface: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = config::ServerConfig::default();
        let path = config::ServerConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        config::ServerConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        config::ServerConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.server.log_level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("usb-install Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    let transfer = config.transfer.transfer_config();
    transfer
        .validate()
        .context("Invalid transfer configuration")?;

    let mut candidates = config.catalog.expanded_paths();
    candidates.extend(args.files);
    let catalog = build_catalog(&candidates);
    if catalog.is_empty() {
        bail!("No files to serve: pass existing .nsp or .xci files");
    }
    info!(
        "Catalog: {} file(s), {} bytes",
        catalog.len(),
        catalog.total_length()
    );

    let target = UsbTarget {
        vendor_id: config.usb.vendor_id()?,
        product_id: config.usb.product_id()?,
        interface: config.usb.interface,
    };

    // libusb calls block, so the session gets its own thread
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("usb-session".to_string())
        .spawn(move || {
            let _ = tx.send(run_usb_session(target, &catalog, &transfer));
        })
        .context("Failed to spawn USB session thread")?;

    tokio::select! {
        result = rx => {
            let summary = result
                .map_err(|_| anyhow!("USB session thread exited without a result"))?
                .context("USB session failed")?;
            info!(
                "Served {} range(s), {} bytes; discarded {} of {} frame(s)",
                summary.ranges_served,
                summary.bytes_streamed,
                summary.frames_discarded,
                summary.frames_received
            );
        }
        result = signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

/// Open the peer and run one session on the calling thread
fn run_usb_session(
    target: UsbTarget,
    catalog: &Catalog,
    transfer: &TransferConfig,
) -> Result<SessionSummary> {
    let context = rusb::Context::new().context("Failed to initialize libusb")?;

    let device = find_device(&context, target.vendor_id, target.product_id).with_context(|| {
        format!(
            "No device {:04x}:{:04x} found",
            target.vendor_id, target.product_id
        )
    })?;

    let endpoints = resolve_endpoints(&device, target.interface)
        .context("Failed to find bulk IN/OUT endpoints")?;

    let link = UsbLink::open(&device, endpoints).context("Failed to open device")?;
    info!(
        "Session on interface {}: IN {:#04x}, OUT {:#04x}",
        link.endpoints().interface,
        link.endpoints().bulk_in,
        link.endpoints().bulk_out
    );

    let summary = serve_session(link, catalog, transfer)?;
    Ok(summary)
}
