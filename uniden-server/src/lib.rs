//! # Uniden Server
//!
//! Session manager for Uniden R4, R8 and R9 radar detectors.
//!
//! This crate runs one detector session on top of [`uniden_core`]:
//! - Connects through a [`transport::Transport`] and subscribes to the
//!   detector's channels
//! - Keeps the settings registry, status and alert table in sync
//! - Turns setting updates into device commands
//! - Publishes what changed as [`session::SessionEvent`]s
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    uniden-server                        │
//! │  ┌──────────────┐            ┌────────────────────────┐ │
//! │  │ SessionHandle│──commands─▶│ Session actor          │ │
//! │  │ (cloneable)  │◀─events────│ - DetectorState        │ │
//! │  └──────────────┘            │ - CallbackScheduler    │ │
//! │                              └───────────┬────────────┘ │
//! │                                          │              │
//! │                                          ▼              │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │ Transport (async-trait)                             ││
//! │  │ - ReplayTransport: JSON-lines capture playback      ││
//! │  └─────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example: Running a Session
//!
//! ```rust,no_run
//! use std::path::Path;
//! use uniden_server::session::SessionBuilder;
//! use uniden_server::transport::replay::ReplayTransport;
//! use uniden_server::SessionConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = ReplayTransport::open(Path::new("drive.jsonl")).unwrap();
//!     let builder = SessionBuilder::new(transport, SessionConfig::default());
//!     let mut events = builder.subscribe();
//!     let (handle, _task) = builder.connect().await.unwrap();
//!
//!     handle.update_setting("Speed Units", 1).await.unwrap();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! ```
//!
//! ## Command-Line Interface
//!
//! See [`Cli`] for all available options. Key options:
//!
//! - `-m, --model` - Detector model (R4, R8, R9)
//! - `-r, --replay` - Capture file to play back
//! - `--set NAME=ID` - Setting updates to send once connected
//! - `-v` - Increase verbosity (use multiple times)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

use uniden_core::Model;

pub mod session;
pub mod transport;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Session configuration file (JSON); flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Detector model: R4, R8 or R9
    #[arg(short, long)]
    pub model: Option<Model>,

    /// Device address, also used to prefix log lines
    #[arg(short, long)]
    pub address: Option<String>,

    /// Play back a JSON-lines capture instead of a live device
    #[arg(short, long)]
    pub replay: Option<PathBuf>,

    /// Seconds to wait for the device to connect and list its channels
    #[arg(long)]
    pub discovery_timeout: Option<u64>,

    /// Do not set the detector's time zone on connect
    #[arg(long, default_value_t = false)]
    pub no_time_sync: bool,

    /// Setting update to send once connected, e.g. `--set "Speed Units=1"`
    #[arg(long = "set", value_name = "NAME=ID", value_parser = parse_assignment)]
    pub set: Vec<(String, u8)>,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, u8), String> {
    let (name, id) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=ID, got '{}'", s))?;
    let id = id
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("invalid value id '{}': {}", id, e))?;
    Ok((name.trim().to_string(), id))
}

impl Cli {
    /// Session configuration: defaults, then the config file, then flags
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(secs) = self.discovery_timeout {
            config.discovery_timeout_secs = secs;
        }
        if self.no_time_sync {
            config.sync_time = false;
        }
        Ok(config)
    }
}

/// Settings of one detector session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub model: Model,
    pub address: String,
    pub discovery_timeout_secs: u64,
    /// Set the detector's time zone from the local clock on connect
    pub sync_time: bool,
    /// Events buffered per subscriber before a slow one starts missing them
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            model: Model::R4,
            address: "detector".to_string(),
            discovery_timeout_secs: 10,
            sync_time: true,
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot read {}", path.display()))?;
        serde_json::from_str(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot parse {}", path.display()))
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}
