//! Detector wire protocol.
//!
//! This module contains the text formats spoken over the detector's
//! characteristic channels. All functions are pure (no I/O).
//!
//! # Structure
//!
//! - [`command`] - `BTreqSETC:` setting commands, written to the command channel
//! - [`status`] - status frames (voltage, GPS, signal)
//! - [`alert`] - radar alert frames and the positional alert table
//! - [`Characteristic`] - the channel routing table
//!
//! # Example
//!
//! ```
//! use uniden_core::protocol::{command, Characteristic};
//!
//! let channel = Characteristic::from_uuid("2c86686a-53dc-25b3-0c4a-f0e10c8dee20");
//! assert_eq!(channel, Some(Characteristic::Command));
//! assert_eq!(command::format_setting_command(60, 1), "BTreqSETC:60=1");
//! ```

use serde::Serialize;

pub mod alert;
pub mod command;
pub mod status;

/// Prefix of every settings command
pub const COMMAND_PREFIX: &str = "BTreqSETC:";

// =============================================================================
// Characteristic Channels
// =============================================================================

/// The characteristic channels this protocol uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Characteristic {
    /// Full configuration memory dump (read + notify)
    Settings,
    /// Status frames (notify)
    Status,
    /// Radar alert frames (notify)
    RadarEvent,
    /// Command responses; content is not interpreted
    Response,
    /// Device information service
    GenericAttribute,
    /// Outbound settings commands (write without response)
    Command,
}

impl Characteristic {
    pub const ALL: [Characteristic; 6] = [
        Characteristic::Settings,
        Characteristic::Status,
        Characteristic::RadarEvent,
        Characteristic::Response,
        Characteristic::GenericAttribute,
        Characteristic::Command,
    ];

    /// Canonical lowercase UUID of the channel
    pub fn uuid(&self) -> &'static str {
        match self {
            Characteristic::Settings => "2d86686a-53dc-25b3-0c4a-f0e10c8dee20",
            Characteristic::Status => "6c290d2e-1c03-aca1-ab48-a9b908bae79e",
            Characteristic::RadarEvent => "6eb675ab-8bd1-1b9a-7444-621e52ec6823",
            Characteristic::Response => "5987b4ef-3bfa-76a8-e642-92933c31434f",
            Characteristic::GenericAttribute => "0000180a-0000-1000-8000-00805f9b34fb",
            Characteristic::Command => "2c86686a-53dc-25b3-0c4a-f0e10c8dee20",
        }
    }

    /// Exact lookup by UUID; case is ignored, nothing else is normalized
    pub fn from_uuid(uuid: &str) -> Option<Characteristic> {
        let uuid = uuid.to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Characteristic::Settings => "Settings",
            Characteristic::Status => "Status",
            Characteristic::RadarEvent => "RadarEvent",
            Characteristic::Response => "Response",
            Characteristic::GenericAttribute => "GenericAttribute",
            Characteristic::Command => "Command",
        }
    }

    /// Whether the device pushes notifications on this channel
    pub fn notifies(&self) -> bool {
        matches!(
            self,
            Characteristic::Settings
                | Characteristic::Status
                | Characteristic::RadarEvent
                | Characteristic::Response
                | Characteristic::GenericAttribute
        )
    }
}

impl std::fmt::Display for Characteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decode a text frame: lossy UTF-8, trimmed of whitespace and NUL padding
pub fn frame_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}
