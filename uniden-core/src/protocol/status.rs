//! Status frame parsing
//!
//! A status frame is ampersand-delimited:
//!
//! ```text
//! <voltage>&<reserved>&<heading>,<reserved>,<altitude>,<gps state>&<reserved>&<signal>
//! ```
//!
//! Numeric fields that are missing or fail to parse become `0.0`. Each such
//! field is reported next to the result so the caller can log it.

use serde::Serialize;

use crate::error::ParseError;

/// GPS receiver connection, from the one-letter code in the GPS record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum GpsState {
    Disconnected,
    Connected,
    #[default]
    Unknown,
}

impl GpsState {
    pub fn from_code(code: &str) -> GpsState {
        match code {
            "D" => GpsState::Disconnected,
            "C" => GpsState::Connected,
            _ => GpsState::Unknown,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gps {
    pub heading: String,
    pub altitude: f32,
    pub state: GpsState,
}

/// Latest status snapshot; each frame replaces it wholesale
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub voltage: f32,
    pub gps: Gps,
    pub signal: f32,
}

/// Parse a float, falling back to 0.0 and recording the degraded field
fn parse_f32(field: &'static str, raw: Option<&str>, errors: &mut Vec<ParseError>) -> f32 {
    match raw.map(|s| s.trim().parse::<f32>()) {
        Some(Ok(v)) => v,
        _ => {
            errors.push(ParseError::MalformedField {
                field,
                raw: raw.unwrap_or_default().to_string(),
            });
            0.0
        }
    }
}

fn parse_gps(record: Option<&str>, errors: &mut Vec<ParseError>) -> Gps {
    let mut parts = record.unwrap_or_default().split(',');
    let heading = parts.next().unwrap_or_default().to_string();
    let _reserved = parts.next();
    let altitude = parse_f32("gps.altitude", parts.next(), errors);
    let state = GpsState::from_code(parts.next().unwrap_or_default());

    Gps {
        heading,
        altitude,
        state,
    }
}

/// Parse a status frame; never fails, degraded fields are returned alongside
pub fn parse_status_frame(text: &str) -> (Status, Vec<ParseError>) {
    let mut errors = Vec::new();
    let fields: Vec<&str> = text.split('&').collect();

    let status = Status {
        voltage: parse_f32("voltage", fields.first().copied(), &mut errors),
        gps: parse_gps(fields.get(2).copied(), &mut errors),
        signal: parse_f32("signal", fields.get(4).copied(), &mut errors),
    };

    (status, errors)
}
