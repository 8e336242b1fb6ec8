//! # Uniden Core
//!
//! Platform-independent protocol library for Uniden R4, R8 and R9 radar
//! detectors.
//!
//! This crate contains the settings catalog, telemetry parsing and command
//! formatting with **zero I/O dependencies**. It does not log and does not
//! spawn anything: every operation returns what happened so the runtime can
//! act on it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  uniden-core (platform-independent, no tokio/async deps)     │
//! │  ├── settings/   (catalog, value sets, registry, resolvers)  │
//! │  ├── protocol/   (commands, status + alert frames, routing)  │
//! │  ├── scheduler   (conditional one-shot callbacks)            │
//! │  └── state       (DetectorState: one session's device data)  │
//! └──────────────────────────────────────────────────────────────┘
//!                              ▲
//!                 ┌────────────┴────────────┐
//!                 │  uniden-server          │
//!                 │  (session actor, tokio) │
//!                 └─────────────────────────┘
//! ```
//!
//! ## Supported Detectors
//!
//! | Model | Notes                                         |
//! |-------|-----------------------------------------------|
//! | R4    |                                               |
//! | R8    | Same settings as R4 at different offsets      |
//! | R9    | No K/Ka band toggles, sensitivities or colors |
//!
//! ## Example: Applying a Settings Dump
//!
//! ```rust
//! use uniden_core::{DetectorState, Model};
//!
//! let mut state = DetectorState::new(Model::R4);
//!
//! let mut dump = vec![0u8; 120];
//! dump[60] = 1; // Speed Units = KPH
//! let changes = state.apply_settings_dump(&dump);
//! assert_eq!(changes[0].name, "Speed Units");
//!
//! // Speed thresholds now use the kph table
//! let quiet_ride = state.registry().lookup_by_name("Quiet Ride Speed").unwrap();
//! let values = state.registry().current_value_set(quiet_ride);
//! assert_eq!(values[0].name, "10kph");
//! ```
//!
//! ## Example: Updating a Setting
//!
//! ```rust
//! use uniden_core::{DetectorState, Model};
//!
//! let mut state = DetectorState::new(Model::R4);
//! state.update_setting("Speed Units", 1).unwrap();
//! assert_eq!(state.take_outbox(), vec!["BTreqSETC:60=1".to_string()]);
//! ```

pub mod error;
pub mod model;
pub mod protocol;
pub mod scheduler;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use error::{ParseError, SettingError};
pub use model::Model;
pub use protocol::alert::{AlertTable, Band, RadarEvent, MAX_ALERT_SLOTS};
pub use protocol::status::{Gps, GpsState, Status};
pub use protocol::Characteristic;
pub use scheduler::{CallbackId, CallbackScheduler, Fired};
pub use settings::{
    Setting, SettingChange, SettingDefinition, SettingSnapshot, SettingsRegistry, Value, ValueSet,
};
pub use state::{DetectorState, Dispatched, SessionFlags};
