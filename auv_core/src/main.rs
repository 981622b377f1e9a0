//! # AUV Control Core Binary
//!
//! Drives the mission and autopilot state machines against the
//! in-process loopback transport at a fixed tick cadence.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults, waiting for a peer to connect
//! auv_core --config config/autopilot.toml
//!
//! # Verbose logging, JSON output
//! auv_core -c config/autopilot.toml -v --json
//! ```

#![deny(warnings)]

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use auv_common::config::{AutopilotConfig, ConfigLoader};
use auv_core::ControlLoop;
use auv_transport::{IngestChannels, Loopback};

/// AUV Control Core - mission/autopilot state machines over a pluggable transport
#[derive(Parser, Debug)]
#[command(name = "auv_core")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Autonomous vessel mission and autopilot control core")]
#[command(long_about = None)]
struct Args {
    /// Path to the autopilot configuration file (autopilot.toml). Built-in
    /// defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address for the operator-facing command channel. Accepted for
    /// forward compatibility with networked `Transport` implementations;
    /// the shipped loopback transport is in-process and ignores it.
    #[arg(long, default_value = "127.0.0.1:7700")]
    command_bind: String,

    /// Bind address for the downstream telemetry sink. Same caveat as
    /// `--command-bind`.
    #[arg(long, default_value = "127.0.0.1:7701")]
    telemetry_bind: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("control core startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_tracing(&args);

    info!("AUV control core v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = auv_common::config::load_or_default(args.config.as_deref())?;

    info!(
        command_bind = %args.command_bind,
        telemetry_bind = %args.telemetry_bind,
        "loopback transport in use, bind addresses are informational only"
    );

    let (transport, sink, peer) = Loopback::new();
    // Loopback has no remote counterpart to dial in from, so the control
    // loop would otherwise wait out the full startup timeout every run.
    // A real Transport's peer connects independently; this stands in for
    // that until a networked implementation is wired up.
    peer.connect();
    std::thread::spawn(move || {
        // Telemetry/report sink: in a real deployment this is an
        // operator/C2 station; here it just drains so the channel never
        // backs up. Logged at debug since actuator commands tick every
        // cycle and would otherwise flood info-level output.
        loop {
            match sink.recv_timeout(Duration::from_secs(1)) {
                Some((topic, payload)) => {
                    tracing::debug!(topic, bytes = payload.len(), "published");
                }
                None => continue,
            }
        }
    });

    let channels = IngestChannels::new();
    let mut control_loop = ControlLoop::new(transport, channels, config.clone());

    let running = control_loop.running_flag();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    if !control_loop.wait_for_peer(config.startup_connect_timeout, Duration::from_millis(100)) {
        error!("no peer connected within startup timeout, shutting down");
        std::process::exit(1);
    }

    control_loop.run();

    info!("AUV control core shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
