//! Detector State
//!
//! [`DetectorState`] is everything a session knows about one connected
//! detector: the settings registry, the latest status snapshot and the alert
//! table. It is the single owner of that data; the runtime feeds it raw
//! notifications through [`DetectorState::dispatch`] and drains the commands
//! it wants written from [`DetectorState::take_outbox`].
//!
//! Writes are fire-and-forget. An accepted update only queues a command and
//! marks the setting as pending; the device's next settings dump decides what
//! the value really is.

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::{ParseError, SettingError};
use crate::model::Model;
use crate::protocol::alert::AlertTable;
use crate::protocol::command::encode_update;
use crate::protocol::status::{parse_status_frame, Status};
use crate::protocol::{frame_text, Characteristic};
use crate::settings::values::time_zone_label;
use crate::settings::{SettingChange, SettingSnapshot, SettingsRegistry};

pub const DETECTOR_VOLUME: &str = "Detector volume";
pub const TIME_ZONE: &str = "Time zone";

/// Volume restored by unmute when no earlier volume is known
const FALLBACK_VOLUME: u8 = 1;

/// What a notification did to the state
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// A settings dump was applied; `changes` is empty when nothing differed
    Settings {
        changes: Vec<SettingChange>,
        /// Settings now holding an id outside their value set
        out_of_range: Vec<String>,
    },
    /// The status snapshot was replaced
    Status { errors: Vec<ParseError> },
    /// The alert table was updated
    RadarEvent { errors: Vec<ParseError> },
    /// A known channel whose content is not interpreted
    Ignored(Characteristic),
    /// A channel this protocol does not read from
    Unhandled(String),
}

/// Flags kept across the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFlags {
    /// Set once the first full settings dump has been applied
    pub received_first_settings: bool,
    pub time_synced: bool,
}

#[derive(Debug, Clone)]
pub struct DetectorState {
    registry: SettingsRegistry,
    status: Status,
    alerts: AlertTable,
    flags: SessionFlags,
    pre_mute_volume: u8,
    outbox: VecDeque<String>,
}

impl DetectorState {
    pub fn new(model: Model) -> Self {
        Self::with_registry(SettingsRegistry::new(model))
    }

    pub fn with_registry(registry: SettingsRegistry) -> Self {
        DetectorState {
            registry,
            status: Status::default(),
            alerts: AlertTable::new(),
            flags: SessionFlags::default(),
            pre_mute_volume: FALLBACK_VOLUME,
            outbox: VecDeque::new(),
        }
    }

    pub fn model(&self) -> Model {
        self.registry.model()
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn alerts(&self) -> &AlertTable {
        &self.alerts
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    /// Whether a full settings dump has been seen yet
    pub fn is_warm(&self) -> bool {
        self.flags.received_first_settings
    }

    pub fn settings(&self) -> Vec<SettingSnapshot> {
        self.registry.snapshot()
    }

    /// Current value id of a setting, by name
    pub fn value_of(&self, name: &str) -> Option<u8> {
        self.registry.lookup_by_name(name).map(|s| s.current())
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Route one notification by channel UUID and apply it
    pub fn dispatch(&mut self, uuid: &str, payload: &[u8], now_ms: u64) -> Dispatched {
        match Characteristic::from_uuid(uuid) {
            Some(Characteristic::Settings) => {
                let changes = self.apply_settings_dump(payload);
                let out_of_range = if changes.is_empty() {
                    Vec::new()
                } else {
                    self.registry.out_of_range_after(&changes)
                };
                Dispatched::Settings {
                    changes,
                    out_of_range,
                }
            }
            Some(Characteristic::Status) => Dispatched::Status {
                errors: self.apply_status_frame(payload),
            },
            Some(Characteristic::RadarEvent) => Dispatched::RadarEvent {
                errors: self.apply_radar_frame(payload, now_ms),
            },
            Some(c @ (Characteristic::Response | Characteristic::GenericAttribute)) => {
                Dispatched::Ignored(c)
            }
            Some(Characteristic::Command) | None => Dispatched::Unhandled(uuid.to_string()),
        }
    }

    /// Apply a full configuration memory dump; returns what changed
    pub fn apply_settings_dump(&mut self, dump: &[u8]) -> Vec<SettingChange> {
        let changes = self.registry.apply_dump(dump);
        self.flags.received_first_settings = true;
        changes
    }

    /// Replace the status snapshot from a status frame
    pub fn apply_status_frame(&mut self, payload: &[u8]) -> Vec<ParseError> {
        let (status, errors) = parse_status_frame(&frame_text(payload));
        self.status = status;
        errors
    }

    /// Update the alert table from a radar frame
    pub fn apply_radar_frame(&mut self, payload: &[u8], now_ms: u64) -> Vec<ParseError> {
        self.alerts.apply_frame(&frame_text(payload), now_ms)
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Queue a validated setting update.
    ///
    /// Nothing is queued when validation fails. The setting's current value
    /// stays as the device last reported it; the request is only recorded as
    /// pending.
    pub fn update_setting(&mut self, name: &str, id: u8) -> Result<(), SettingError> {
        let command = encode_update(&self.registry, name, id)?;
        self.outbox.push_back(command);
        self.registry.mark_pending(name, id);
        Ok(())
    }

    /// Queue an update given the value by name
    pub fn update_setting_by_value(
        &mut self,
        name: &str,
        value_name: &str,
    ) -> Result<(), SettingError> {
        let id = self.registry.value_id(name, value_name)?;
        self.update_setting(name, id)
    }

    /// Queue raw text for the command channel
    pub fn send_arbitrary_command(&mut self, text: impl Into<String>) {
        self.outbox.push_back(text.into());
    }

    /// Commands waiting to be written, oldest first
    pub fn take_outbox(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    pub fn has_outbound(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Set the detector volume to 0, remembering the volume to restore.
    ///
    /// Does nothing when already muted.
    pub fn mute(&mut self) -> Result<(), SettingError> {
        let volume = self
            .value_of(DETECTOR_VOLUME)
            .ok_or_else(|| SettingError::NotFound(DETECTOR_VOLUME.to_string()))?;
        if volume == 0 {
            return Ok(());
        }

        self.update_setting(DETECTOR_VOLUME, 0)?;
        self.pre_mute_volume = volume;
        Ok(())
    }

    /// Restore the volume saved by [`mute`](Self::mute). Does nothing unless muted.
    pub fn unmute(&mut self) -> Result<(), SettingError> {
        let volume = self
            .value_of(DETECTOR_VOLUME)
            .ok_or_else(|| SettingError::NotFound(DETECTOR_VOLUME.to_string()))?;
        if volume != 0 {
            return Ok(());
        }

        if self.pre_mute_volume == 0 {
            self.pre_mute_volume = FALLBACK_VOLUME;
        }
        self.update_setting(DETECTOR_VOLUME, self.pre_mute_volume)
    }

    pub fn pre_mute_volume(&self) -> u8 {
        self.pre_mute_volume
    }

    /// Point the "Time zone" setting at a whole-hour UTC offset
    pub fn sync_time(&mut self, utc_offset_hours: i32) -> Result<(), SettingError> {
        self.update_setting_by_value(TIME_ZONE, &time_zone_label(utc_offset_hours))?;
        self.flags.time_synced = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::alert::Band;
    use crate::protocol::status::GpsState;

    const SETTINGS: &str = "2d86686a-53dc-25b3-0c4a-f0e10c8dee20";
    const STATUS: &str = "6c290d2e-1c03-aca1-ab48-a9b908bae79e";
    const RADAR: &str = "6eb675ab-8bd1-1b9a-7444-621e52ec6823";
    const COMMAND: &str = "2c86686a-53dc-25b3-0c4a-f0e10c8dee20";
    const RESPONSE: &str = "5987b4ef-3bfa-76a8-e642-92933c31434f";

    fn dump(pairs: &[(usize, u8)]) -> Vec<u8> {
        let mut dump = vec![0u8; 120];
        for &(offset, value) in pairs {
            dump[offset] = value;
        }
        dump
    }

    #[test]
    fn test_dispatch_settings_dump() {
        let mut state = DetectorState::new(Model::R4);
        assert!(!state.is_warm());

        let result = state.dispatch(SETTINGS, &dump(&[(60, 1)]), 0);
        match result {
            Dispatched::Settings { changes, out_of_range } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].name, "Speed Units");
                assert!(out_of_range.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(state.is_warm());

        let again = state.dispatch(SETTINGS, &dump(&[(60, 1)]), 0);
        assert_eq!(
            again,
            Dispatched::Settings {
                changes: vec![],
                out_of_range: vec![]
            }
        );
    }

    #[test]
    fn test_dispatch_reports_out_of_range() {
        let mut state = DetectorState::new(Model::R4);
        let result = state.dispatch(SETTINGS, &dump(&[(60, 9)]), 0);
        match result {
            Dispatched::Settings { out_of_range, .. } => {
                assert_eq!(out_of_range, vec!["Speed Units".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(state.value_of("Speed Units"), Some(9));
    }

    #[test]
    fn test_dispatch_reports_speeds_left_out_of_range_by_unit_change() {
        let mut state = DetectorState::new(Model::R4);
        // 90mph is index 17 of the mph table; the kph table stops at index 8
        state.dispatch(SETTINGS, &dump(&[(77, 17)]), 0);

        let result = state.dispatch(SETTINGS, &dump(&[(60, 1), (77, 17)]), 0);
        match result {
            Dispatched::Settings { changes, out_of_range } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].name, "Speed Units");
                assert_eq!(out_of_range, vec!["Quiet Ride Speed".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let quiet_ride = state.registry().lookup_by_name("Quiet Ride Speed").unwrap();
        assert_eq!(state.registry().current_value(quiet_ride), None);
    }

    #[test]
    fn test_dispatch_status_and_radar() {
        let mut state = DetectorState::new(Model::R9);
        let result = state.dispatch(STATUS, b"12.5&0&N,0,10,D&0&4\0", 0);
        assert_eq!(result, Dispatched::Status { errors: vec![] });
        assert_eq!(state.status().voltage, 12.5);
        assert_eq!(state.status().gps.state, GpsState::Disconnected);

        state.dispatch(RADAR, b"0&12,00,K,5,123,24.109,0,1&0&0", 42);
        let alert = state.alerts().get(1).unwrap();
        assert_eq!(alert.band, Band::K);
        assert_eq!(alert.last_update_ms, 42);
    }

    #[test]
    fn test_dispatch_unmatched_channels() {
        let mut state = DetectorState::new(Model::R4);
        assert_eq!(
            state.dispatch(RESPONSE, b"OK", 0),
            Dispatched::Ignored(Characteristic::Response)
        );
        assert_eq!(
            state.dispatch(COMMAND, b"BTreqSETC:60=1", 0),
            Dispatched::Unhandled(COMMAND.to_string())
        );
        assert_eq!(
            state.dispatch("1234", b"", 0),
            Dispatched::Unhandled("1234".to_string())
        );
        assert_eq!(state.value_of("Speed Units"), Some(0));
    }

    #[test]
    fn test_update_setting_is_fire_and_forget() {
        let mut state = DetectorState::new(Model::R4);
        state.update_setting("Speed Units", 1).unwrap();

        let units = state.registry().lookup_by_name("Speed Units").unwrap();
        assert_eq!(units.current(), 0);
        assert_eq!(units.pending(), Some(1));
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:60=1".to_string()]);
        assert!(!state.has_outbound());

        // Confirmation arrives with the next dump
        state.dispatch(SETTINGS, &dump(&[(60, 1)]), 0);
        let units = state.registry().lookup_by_name("Speed Units").unwrap();
        assert_eq!(units.current(), 1);
        assert_eq!(units.pending(), None);
    }

    #[test]
    fn test_rejected_update_queues_nothing() {
        let mut state = DetectorState::new(Model::R4);
        assert!(state.update_setting("Speed Units", 4).is_err());
        assert!(state.take_outbox().is_empty());
    }

    #[test]
    fn test_mute_unmute_restores_volume() {
        let mut state = DetectorState::new(Model::R4);
        state.apply_settings_dump(&dump(&[(91, 6)]));

        state.mute().unwrap();
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:91=0".to_string()]);
        assert_eq!(state.pre_mute_volume(), 6);

        // Device confirms
        state.apply_settings_dump(&dump(&[(91, 0)]));
        state.mute().unwrap();
        assert!(state.take_outbox().is_empty());

        state.unmute().unwrap();
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:91=6".to_string()]);
    }

    #[test]
    fn test_unmute_falls_back_to_volume_one() {
        let mut state = DetectorState::new(Model::R8);
        state.unmute().unwrap();
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:101=1".to_string()]);

        state.apply_settings_dump(&dump(&[(101, 3)]));
        state.unmute().unwrap();
        assert!(state.take_outbox().is_empty());
    }

    #[test]
    fn test_sync_time() {
        let mut state = DetectorState::new(Model::R4);
        state.sync_time(-5).unwrap();
        assert!(state.flags().time_synced);
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:81=7".to_string()]);

        state.sync_time(0).unwrap();
        assert_eq!(state.take_outbox(), vec!["BTreqSETC:81=12".to_string()]);

        assert!(state.sync_time(14).is_err());
    }

    #[test]
    fn test_arbitrary_command() {
        let mut state = DetectorState::new(Model::R4);
        state.send_arbitrary_command("BTreqSETC:1=1");
        state.update_setting("Speed Units", 1).unwrap();
        assert_eq!(
            state.take_outbox(),
            vec!["BTreqSETC:1=1".to_string(), "BTreqSETC:60=1".to_string()]
        );
    }
}
