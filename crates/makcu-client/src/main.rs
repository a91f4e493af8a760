//! makcu-client command-line entry point.
//!
//! Loads the config, locates the backend, connects, runs one action and
//! disconnects.
//!
//! ```text
//! makcu-client [--config PATH] status
//! makcu-client [--config PATH] move DX DY
//! makcu-client [--config PATH] smooth DX DY [SEGMENTS]
//! makcu-client [--config PATH] click [BUTTON]
//! makcu-client [--config PATH] scroll DELTA
//! ```
//!
//! Movement, click and scroll are fire-and-forget: a zero exit status only
//! means the command was dispatched while connected.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use makcu_client::compat::ButtonName;
use makcu_client::infrastructure::storage::config::{load_config, load_config_from};
use makcu_client::DeviceClient;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Drives a MAKCU device through the makcu-cpp backend.
#[derive(Debug, Parser)]
#[command(name = "makcu-client", version)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

/// One action to run while connected.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Action {
    /// Print the session status, device link state and firmware version.
    Status,
    /// Move the pointer by a relative offset.
    Move {
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        #[arg(allow_negative_numbers = true)]
        dy: i32,
    },
    /// Move by a relative offset, interpolated by the backend.
    Smooth {
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        #[arg(allow_negative_numbers = true)]
        dy: i32,
        /// Interpolation steps; the configured default when omitted.
        segments: Option<u32>,
    },
    /// Click `left`, `right` or `middle`; anything else clicks left.
    Click {
        #[arg(default_value = "left")]
        button: String,
    },
    /// Scroll the wheel; positive scrolls up.
    Scroll {
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
}

async fn run(client: &DeviceClient, action: &Action) -> anyhow::Result<()> {
    let dispatched = match action {
        Action::Status => {
            let link = client.query_status().await;
            let version = client.firmware_version().await;
            println!("{}", client.status_text());
            match link {
                Some(up) => println!("device link: {}", if up { "up" } else { "down" }),
                None => println!("device link: unknown"),
            }
            if let Some(version) = version {
                println!("firmware: {version}");
            }
            true
        }
        Action::Move { dx, dy } => client.move_by(*dx, *dy).await,
        Action::Smooth { dx, dy, segments } => client.move_smooth(*dx, *dy, *segments).await,
        Action::Click { button } => {
            let name = ButtonName::from(button.as_str());
            client.click(name.to_mouse_button()).await
        }
        Action::Scroll { delta } => client.scroll(*delta).await,
    };
    if !dispatched {
        bail!("device is not connected");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let client = DeviceClient::launch(&config).context("cannot start device control")?;

    if !client.connect().await {
        error!("could not connect to the device");
        bail!("connect failed");
    }

    let result = run(&client, &cli.action).await;
    client.disconnect().await;
    info!("{}", client.status_text());
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
