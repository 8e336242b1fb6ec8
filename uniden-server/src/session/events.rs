use serde::Serialize;

use uniden_core::{AlertTable, SettingChange, Status};

/// Events emitted by a running session.
///
/// Delivered over a broadcast channel; a slow subscriber may miss events but
/// never blocks the session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// Every setting that differed in one settings dump
    SettingsChanged(Vec<SettingChange>),
    StatusUpdated(Status),
    /// The whole alert table after a radar frame
    RadarEvent(AlertTable),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Connected => "connected",
            SessionEvent::Disconnected => "disconnected",
            SessionEvent::SettingsChanged(_) => "settingsChanged",
            SessionEvent::StatusUpdated(_) => "statusUpdated",
            SessionEvent::RadarEvent(_) => "radarEvent",
        }
    }
}
