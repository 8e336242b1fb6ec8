//! Settings catalog
//!
//! Declarative table of every known setting: its storage offset in the
//! configuration memory of each model and its value set.
//!
//! The table keeps the entries exactly as the devices document them,
//! including names that appear more than once. Lookups take the first match,
//! so later entries with a repeated name (or a repeated offset) are shadowed.

use serde::{Deserialize, Serialize};

use super::resolver::{ResolverId, ValueSource};
use super::values::{self, ValueSet};
use crate::model::Model;

/// Storage offset per model; `None` where the model does not have the setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOffsets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r4: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r8: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r9: Option<usize>,
}

impl StorageOffsets {
    /// Offsets present on all three models
    pub const fn all(r4: usize, r8: usize, r9: usize) -> Self {
        StorageOffsets {
            r4: Some(r4),
            r8: Some(r8),
            r9: Some(r9),
        }
    }

    /// Offsets for settings the R9 does not have
    pub const fn r4_r8(r4: usize, r8: usize) -> Self {
        StorageOffsets {
            r4: Some(r4),
            r8: Some(r8),
            r9: None,
        }
    }

    pub fn get(&self, model: Model) -> Option<usize> {
        match model {
            Model::R4 => self.r4,
            Model::R8 => self.r8,
            Model::R9 => self.r9,
        }
    }
}

/// One row of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDefinition {
    pub name: String,
    pub offsets: StorageOffsets,
    pub values: ValueSource,
}

impl SettingDefinition {
    pub fn new(name: &str, offsets: StorageOffsets, values: ValueSet) -> Self {
        SettingDefinition {
            name: name.to_string(),
            offsets,
            values: ValueSource::Static(values),
        }
    }

    pub fn dynamic(name: &str, offsets: StorageOffsets, resolver: ResolverId) -> Self {
        SettingDefinition {
            name: name.to_string(),
            offsets,
            values: ValueSource::Dynamic(resolver),
        }
    }

    /// On/off setting
    pub fn boolean(name: &str, offsets: StorageOffsets) -> Self {
        Self::new(name, offsets, values::boolean())
    }

    /// Ka band scan segment toggle; segments are stored consecutively after `base`
    pub fn ka_segment(segment: usize, base: StorageOffsets) -> Self {
        let at = |offset: Option<usize>| offset.map(|o| o - 1 + segment);
        Self::boolean(
            &format!("Ka Segment {}", segment),
            StorageOffsets {
                r4: at(base.r4),
                r8: at(base.r8),
                r9: at(base.r9),
            },
        )
    }
}

use StorageOffsets as At;

/// The full catalog, in declaration order
pub fn definitions() -> Vec<SettingDefinition> {
    let mut defs = vec![
        SettingDefinition::new(
            "Speed Cameras Alert Distance",
            At::all(8, 9, 11),
            values::values(&[
                ("1000ft / 300m", 1),
                ("2000ft / 600m", 2),
                ("2500ft / 760m", 3),
                ("3000ft / 900m", 4),
                ("Auto", 5),
            ]),
        ),
        SettingDefinition::boolean("Enable Speed Cameras", At::all(7, 8, 10)),
        SettingDefinition::new(
            "Alerts Priority",
            At::all(46, 48, 55),
            values::alerts_priority(),
        ),
        SettingDefinition::boolean("Auto mute memory option", At::all(95, 51, 58)),
        SettingDefinition::boolean("Enable Red Light Cameras", At::all(9, 10, 12)),
        SettingDefinition::new("Background Color", At::all(50, 53, 60), values::colors()),
        SettingDefinition::dynamic(
            "Quiet Ride Speed",
            At::all(77, 87, 104),
            ResolverId::QuietRideSpeed,
        ),
        SettingDefinition::boolean("Auto mute memory option", At::all(95, 51, 58)),
        SettingDefinition::dynamic(
            "Red light camera quiet ride speed",
            At::all(10, 11, 13),
            ResolverId::RedLightQuietRideSpeed,
        ),
        SettingDefinition::new(
            "Operation mode",
            At::all(1, 1, 1),
            values::enumerated(&["Highway", "City", "Auto City", "Advanced"]),
        ),
        SettingDefinition::dynamic(
            "Auto City Mode Speed",
            At::all(5, 5, 8),
            ResolverId::AutoCityModeSpeed,
        ),
        SettingDefinition::new(
            "Speed Units",
            At::all(60, 68, 86),
            values::enumerated(&["MPH", "KPH"]),
        ),
        // Bands
        SettingDefinition::boolean("X Band", At::all(13, 15, 0)),
        SettingDefinition::boolean("K Band", At::r4_r8(14, 16)),
        SettingDefinition::boolean("Ka Band", At::r4_r8(15, 17)),
        SettingDefinition::boolean("Laser", At::all(16, 18, 25)),
        SettingDefinition::boolean("K POP", At::all(26, 28, 35)),
        SettingDefinition::boolean("Ka POP", At::all(29, 31, 38)),
        // Band sensitivities
        SettingDefinition::new(
            "X band sensitivity",
            At::r4_r8(2, 2),
            values::slider_range(30, 100, 10, "%"),
        ),
        SettingDefinition::new(
            "K band sensitivity",
            At::r4_r8(3, 3),
            values::slider_range(30, 100, 10, "%"),
        ),
        SettingDefinition::new(
            "Ka band sensitivity",
            At::r4_r8(4, 4),
            values::slider_range(30, 100, 10, "%"),
        ),
        // Band filters
        SettingDefinition::boolean("K band filter", At::all(30, 32, 39)),
        SettingDefinition::new(
            "K block 24.199 (±0.002) filter",
            At::r4_r8(33, 35),
            values::off_on_weak(),
        ),
        SettingDefinition::new(
            "K block 24.168 (±0.002) filter",
            At::r4_r8(34, 36),
            values::off_on_weak(),
        ),
        SettingDefinition::new(
            "K scan width",
            At::all(35, 37, 44),
            values::enumerated(&["WIDE", "NARROW", "EXTENDED"]),
        ),
    ];

    // Ka scan segments
    for segment in 1..=9 {
        defs.push(SettingDefinition::ka_segment(segment, At::all(37, 39, 46)));
    }

    defs.extend([
        SettingDefinition::new(
            "Auto mute volume",
            At::all(69, 78, 96),
            values::slider_range(0, 7, 1, ""),
        ),
        SettingDefinition::new(
            "Auto mute memory option",
            At::all(95, 51, 58),
            values::mute_memory(),
        ),
        SettingDefinition::new(
            "Mute memory option",
            At::all(47, 49, 56),
            values::mute_memory(),
        ),
        SettingDefinition::new(
            "Quiet ride beep volume",
            At::all(79, 89, 106),
            values::slider_range(0, 8, 1, ""),
        ),
        SettingDefinition::new(
            "Quiet ride beep volume",
            At::all(79, 89, 106),
            values::slider_range(0, 8, 1, ""),
        ),
        // Band tones
        SettingDefinition::new("X band tone", At::all(61, 69, 87), values::tones()),
        SettingDefinition::new("K band tone", At::all(62, 70, 88), values::tones()),
        SettingDefinition::new("Ka band tone", At::all(65, 74, 92), values::tones()),
        SettingDefinition::new("MRCD/T tone", At::all(63, 72, 90), values::tones()),
        SettingDefinition::new("Gatso tone", At::all(64, 73, 91), values::tones()),
        SettingDefinition::new("Laser tone", At::all(67, 76, 94), values::tones()),
        SettingDefinition::new("K band bogey tone", At::all(93, 71, 89), values::tones()),
        SettingDefinition::new("Ka band bogey tone", At::all(66, 75, 93), values::tones()),
        SettingDefinition::new(
            "Alerts priority",
            At::all(46, 48, 55),
            values::alerts_priority(),
        ),
        SettingDefinition::dynamic("Limit speed", At::all(80, 90, 107), ResolverId::LimitSpeed),
        // Display
        SettingDefinition::new(
            "Display mode",
            At::all(56, 64, 83),
            values::enumerated(&["SCAN", "MODE", "TIME"]),
        ),
        SettingDefinition::new(
            "Alert dsplay mode",
            At::all(59, 67, 155),
            values::enumerated(&["DISPLAY_1", "DISPLAY_2", "DISPLAY_3"]),
        ),
        SettingDefinition::new("Left display", At::all(58, 66, 85), values::left_display()),
        SettingDefinition::new("Left display", At::all(58, 66, 85), values::left_display()),
        SettingDefinition::new("X band color", At::r4_r8(51, 59), values::band_colors()),
        SettingDefinition::new("K band color", At::r4_r8(52, 60), values::band_colors()),
        SettingDefinition::new("Ka band color", At::r4_r8(55, 53), values::band_colors()),
        SettingDefinition::new("MRCD/T color", At::r4_r8(53, 61), values::band_colors()),
        SettingDefinition::new("Gatso color", At::r4_r8(54, 62), values::band_colors()),
        // Brightness
        SettingDefinition::new(
            "Display brightness",
            At::all(92, 102, 119),
            values::brightness(&["OFF", "DARK", "DIMMER", "DIM", "BRIGHT", "AUTO"]),
        ),
        SettingDefinition::new(
            "Dark mode",
            At::all(70, 80, 97),
            values::brightness(&["DIMMER", "DIM", "BRIGHT"]),
        ),
        SettingDefinition::new(
            "Bright brightness",
            At::all(73, 83, 100),
            values::brightness(&["DIMMER", "DIM", "BRIGHT"]),
        ),
        SettingDefinition::new(
            "Dim brightness",
            At::all(75, 85, 102),
            values::brightness(&["OFF", "DARK", "DIMMER", "DIM", "BRIGHT"]),
        ),
        SettingDefinition::new(
            "Auto dim mode",
            At::all(70, 80, 97),
            values::enumerated(&["SENSOR", "TIME"]),
        ),
        SettingDefinition::new(
            "Bright time",
            At::all(72, 82, 99),
            values::quarter_hours(5 * 60 + 30, 7 * 60 + 30),
        ),
        SettingDefinition::new(
            "Dim time",
            At::all(74, 84, 101),
            values::quarter_hours(5 * 60, 8 * 60),
        ),
        // Clock, volume and memory
        SettingDefinition::new("Time zone", At::all(81, 91, 108), values::time_zones()),
        SettingDefinition::new(
            "Detector volume",
            At::all(91, 101, 118),
            values::detector_volume(),
        ),
        SettingDefinition::new(
            "Memory Quota",
            At::all(90, 100, 117),
            values::memory_quota(),
        ),
        // Toggles
        SettingDefinition::boolean("Enable quiet ride for MRCD/T", At::all(78, 88, 105)),
        SettingDefinition::boolean("Daylight Savings Time (DST)", At::all(82, 92, 109)),
        SettingDefinition::boolean("Low battery voltage warning", At::all(83, 93, 110)),
        SettingDefinition::boolean("Enable auto mute memory", At::all(48, 50, 57)),
        SettingDefinition::boolean("Vehicle battery saver", At::all(84, 94, 111)),
        SettingDefinition::boolean("All threat display", At::all(57, 65, 84)),
        SettingDefinition::boolean("KA frequency voice", At::all(12, 14, 16)),
        SettingDefinition::boolean("Enable auto mute", At::all(68, 77, 95)),
        SettingDefinition::boolean("Ka band filter", At::all(31, 33, 40)),
        SettingDefinition::boolean("Ka band filter", At::all(28, 30, 37)),
        SettingDefinition::boolean("POI Passchime", At::all(49, 12, 14)),
        SettingDefinition::boolean("Laser gun ID", At::all(17, 19, 26)),
        SettingDefinition::boolean("Enable voice", At::all(11, 13, 15)),
        SettingDefinition::boolean("Self test", At::all(85, 95, 112)),
        SettingDefinition::boolean("Backlight", At::all(76, 86, 103)),
        SettingDefinition::boolean("Scan icon", At::all(57, 65, 84)),
        SettingDefinition::boolean("MRCD/T", At::all(27, 29, 36)),
        SettingDefinition::boolean("TSF", At::all(32, 34, 41)),
        SettingDefinition::boolean("GPS", At::all(6, 7, 9)),
    ]);

    defs
}
