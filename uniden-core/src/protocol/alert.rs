//! Radar alert frames and the alert table
//!
//! An alert frame is an ampersand-delimited list of slots. The position of a
//! slot in the frame is its index in the alert table:
//!
//! ```text
//! 0&12,00,K,5,123,24.109,0,1&0&0
//! ```
//!
//! A slot is either `0` (no alert at this index) or a comma-delimited record
//! whose field 2 is the band, field 3 the strength and field 5 the frequency
//! in GHz. The other fields are not interpreted.
//!
//! Consumers address alerts by position, so the table never removes or
//! renumbers entries. Empty slots are kept as `None`.

use serde::{Serialize, Serializer};

use crate::error::ParseError;

/// Highest number of alert slots the table keeps
pub const MAX_ALERT_SLOTS: usize = 8;

/// Radar band of an alert
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Band {
    X,
    K,
    Ka,
    Laser,
    Gatso,
    /// A code this library does not know; kept verbatim
    Other(String),
}

impl Band {
    pub fn from_code(code: &str) -> Band {
        match code {
            "X" => Band::X,
            "K" => Band::K,
            "Ka" => Band::Ka,
            "Laser" => Band::Laser,
            "Gatso" => Band::Gatso,
            other => Band::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Band::X => "X",
            Band::K => "K",
            Band::Ka => "Ka",
            Band::Laser => "Laser",
            Band::Gatso => "Gatso",
            Band::Other(code) => code,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Band {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One active detection
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarEvent {
    pub band: Band,
    /// GHz
    pub frequency: f32,
    pub strength: i32,
    /// Milliseconds timestamp of the frame that last wrote this slot
    pub last_update_ms: u64,
}

impl RadarEvent {
    /// Parse one non-empty slot record; missing fields get defaults
    fn parse(record: &str, now_ms: u64, errors: &mut Vec<ParseError>) -> RadarEvent {
        let fields: Vec<&str> = record.split(',').map(str::trim).collect();

        let band = match fields.get(2) {
            Some(code) => Band::from_code(code),
            None => {
                errors.push(ParseError::MalformedField {
                    field: "alert.band",
                    raw: String::new(),
                });
                Band::Other(String::new())
            }
        };

        let strength = match fields.get(3).map(|s| s.parse::<i32>()) {
            Some(Ok(v)) => v,
            _ => {
                errors.push(ParseError::MalformedField {
                    field: "alert.strength",
                    raw: fields.get(3).unwrap_or(&"").to_string(),
                });
                0
            }
        };

        let frequency = match fields.get(5).map(|s| s.parse::<f32>()) {
            Some(Ok(v)) => v,
            _ => {
                errors.push(ParseError::MalformedField {
                    field: "alert.frequency",
                    raw: fields.get(5).unwrap_or(&"").to_string(),
                });
                0.0
            }
        };

        RadarEvent {
            band,
            frequency,
            strength,
            last_update_ms: now_ms,
        }
    }
}

/// Positional table of active alerts
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlertTable {
    slots: Vec<Option<RadarEvent>>,
}

impl AlertTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RadarEvent> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<RadarEvent>] {
        &self.slots
    }

    /// Active alerts with their slot index
    pub fn active(&self) -> impl Iterator<Item = (usize, &RadarEvent)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (i, e)))
    }

    fn set(&mut self, index: usize, event: Option<RadarEvent>) {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = event;
    }

    /// Apply one alert frame.
    ///
    /// Slots named in the frame are overwritten or cleared; slots beyond the
    /// frame keep their content. Returns the degraded fields and the slots
    /// dropped for exceeding [`MAX_ALERT_SLOTS`].
    pub fn apply_frame(&mut self, text: &str, now_ms: u64) -> Vec<ParseError> {
        let mut errors = Vec::new();

        for (index, slot) in text.split('&').enumerate() {
            if index >= MAX_ALERT_SLOTS {
                errors.push(ParseError::TooManySlots {
                    index,
                    capacity: MAX_ALERT_SLOTS,
                });
                continue;
            }

            let slot = slot.trim();
            let event = match slot {
                "0" | "" => None,
                record => Some(RadarEvent::parse(record, now_ms, &mut errors)),
            };
            self.set(index, event);
        }

        errors
    }
}
