//! Error types for the settings registry and protocol parsing

use thiserror::Error;

use crate::model::Model;

/// Errors returned when looking up, validating or encoding a setting.
///
/// These are caller errors: they are reported back to whoever asked for the
/// change and never affect the session itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    /// No setting with this name exists in the catalog
    #[error("Setting '{0}' not found")]
    NotFound(String),

    /// Candidate id is not a member of the setting's current value set
    #[error("Value {value} is not valid for setting '{setting}'")]
    InvalidValue { setting: String, value: u8 },

    /// No value with this name exists in the setting's current value set
    #[error("Value '{value}' is not valid for setting '{setting}'")]
    UnknownValueName { setting: String, value: String },

    /// The setting is not stored in the active model's memory layout
    #[error("Setting '{setting}' has no storage offset on model {model}")]
    NoStorageOffset { setting: String, model: Model },

    /// A dynamic value resolver depends on a setting that is missing or dynamic itself
    #[error("Values of '{setting}' depend on '{dependency}', which is not a static setting")]
    ResolverDependency { setting: String, dependency: String },
}

/// Errors that can occur when parsing frames or command strings.
///
/// Telemetry decoding never fails as a whole; the decoders substitute a
/// fallback value and report each degraded field with one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A numeric field could not be parsed, or was missing
    #[error("Malformed field '{field}': {raw:?}")]
    MalformedField { field: &'static str, raw: String },

    /// An alert slot index lies beyond the alert table capacity
    #[error("Alert slot {index} exceeds the table capacity of {capacity}")]
    TooManySlots { index: usize, capacity: usize },

    /// Text is not a settings command
    #[error("Invalid settings command: {0}")]
    InvalidCommand(String),
}
