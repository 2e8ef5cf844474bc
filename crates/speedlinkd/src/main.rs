//! Speedlink - truck-sim telemetry to serial gauge bridge.
//!
//! Polls the local telemetry HTTP endpoint, forwards speed/RPM frames to a
//! microcontroller over a serial link, and shows the same values in a
//! terminal dashboard.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use speedlink_common::Settings;
use speedlinkd::bridge::spawn_bridge;
use speedlinkd::config::Config;
use speedlinkd::device::{list_ports, SerialLink};
use speedlinkd::telemetry::HttpTelemetrySource;
use speedlinkd::{autostart, launcher, logging, tui};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "speedlinkd")]
#[command(about = "Telemetry to serial gauge bridge", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge with the dashboard (default)
    Run {
        /// Serial port to use (defaults to the first enumerated port)
        #[arg(long)]
        port: Option<String>,

        /// No dashboard; log events instead
        #[arg(long)]
        headless: bool,
    },

    /// List currently available serial ports
    Ports,

    /// Manage the start-at-login entry
    Autostart {
        #[command(subcommand)]
        action: AutostartAction,
    },

    /// Show or change persisted settings
    Settings {
        /// Set the telemetry server executable path
        #[arg(long)]
        telemetry_path: Option<String>,
    },
}

#[derive(Subcommand)]
enum AutostartAction {
    /// Register the running executable to start at login
    Enable,
    /// Remove the start-at-login entry
    Disable,
    /// Report whether the entry exists
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run {
        port: None,
        headless: false,
    }) {
        Commands::Run { port, headless } => run_bridge(port, headless).await,
        Commands::Ports => {
            logging::init_stderr();
            for port in list_ports()? {
                println!("{}", port);
            }
            Ok(())
        }
        Commands::Autostart { action } => {
            logging::init_stderr();
            match action {
                AutostartAction::Enable => autostart::enable()?,
                AutostartAction::Disable => autostart::disable()?,
                AutostartAction::Status => {
                    println!(
                        "{}",
                        if autostart::is_enabled() { "enabled" } else { "disabled" }
                    );
                }
            }
            Ok(())
        }
        Commands::Settings { telemetry_path } => {
            logging::init_stderr();
            let path = Settings::discover_path()?;
            let mut settings = Settings::load();
            if let Some(new_path) = telemetry_path {
                settings.telemetry_path = new_path;
                settings.save()?;
            }
            println!("{}", path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

async fn run_bridge(port: Option<String>, headless: bool) -> Result<()> {
    if headless {
        logging::init_stderr();
    } else {
        logging::init_file()?;
    }

    info!("Speedlink v{} starting", VERSION);

    let config = Config::load();
    let settings = Settings::load();

    // Default to the first enumerated port, like the port selector would.
    let active_port = match port {
        Some(p) => Some(p),
        None => list_ports().unwrap_or_default().into_iter().next(),
    };
    match &active_port {
        Some(p) => info!("Active serial port: {}", p),
        None => warn!("No serial port available yet"),
    }

    let source = HttpTelemetrySource::new(&config.telemetry.endpoint, config.http_timeout())?;
    let link = SerialLink::new(config.device.baud, config.serial_timeout());

    let (handle, mut events) = spawn_bridge(&config, active_port.clone(), source, link);

    if settings.auto_launch_telemetry {
        if let Err(e) = launcher::launch(&settings) {
            warn!("Auto-launch failed: {}", e);
        }
    }

    let ui = if headless {
        tui::run_headless(&mut events).await
    } else {
        tui::run(&handle, &mut events, settings, active_port.as_deref()).await
    };

    // Cooperative shutdown: the loop observes the flag, closes the serial
    // handle, then we return.
    handle.shutdown().await;
    info!("Shutting down gracefully");

    ui
}
