//! Dynamic value sets
//!
//! Some value sets depend on the live state of other settings, e.g. the
//! speed thresholds follow the "Speed Units" toggle. The catalog refers to
//! these by [`ResolverId`] instead of holding closures, so definitions stay
//! plain data. A resolver is a pure function of registry state and may only
//! read settings with static value sets, which
//! [`SettingsRegistry::from_definitions`](super::SettingsRegistry::from_definitions)
//! checks once at construction.

use serde::{Deserialize, Serialize};

use super::values::{step_range, Value, ValueSet};
use super::SettingsRegistry;

/// Name of the setting every speed resolver is keyed by
pub const SPEED_UNITS: &str = "Speed Units";

/// Where a setting's value set comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// Fixed when the catalog is loaded
    Static(ValueSet),
    /// Computed on every read against the registry
    Dynamic(ResolverId),
}

/// Identifies one entry of the resolver registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolverId {
    QuietRideSpeed,
    RedLightQuietRideSpeed,
    AutoCityModeSpeed,
    LimitSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedUnit {
    Mph,
    Kph,
}

impl SpeedUnit {
    fn suffix(self) -> &'static str {
        match self {
            SpeedUnit::Mph => "mph",
            SpeedUnit::Kph => "kph",
        }
    }
}

/// How a speed table numbers its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedIds {
    /// Position in the table
    Index,
    /// The speed itself
    Literal,
}

/// Inclusive `(start, end, step)` speed ranges for both unit systems
#[derive(Debug, Clone, Copy)]
struct SpeedTable {
    mph: (u32, u32, u32),
    kph: (u32, u32, u32),
    ids: SpeedIds,
    with_off: bool,
}

impl SpeedTable {
    fn values(&self, unit: SpeedUnit) -> ValueSet {
        let (start, end, step) = match unit {
            SpeedUnit::Mph => self.mph,
            SpeedUnit::Kph => self.kph,
        };

        let mut set = Vec::new();
        if self.with_off {
            set.push(Value::new("Off", 0));
        }
        for (idx, speed) in step_range(start, end, step).into_iter().enumerate() {
            let id = match self.ids {
                SpeedIds::Index => idx as u8,
                SpeedIds::Literal => speed as u8,
            };
            set.push(Value::new(format!("{}{}", speed, unit.suffix()), id));
        }
        set
    }
}

impl ResolverId {
    /// The setting this resolver reads
    pub fn dependency(&self) -> &'static str {
        SPEED_UNITS
    }

    fn table(&self) -> SpeedTable {
        match self {
            ResolverId::QuietRideSpeed => SpeedTable {
                mph: (5, 90, 5),
                kph: (10, 90, 10),
                ids: SpeedIds::Index,
                with_off: false,
            },
            ResolverId::RedLightQuietRideSpeed => SpeedTable {
                mph: (50, 85, 5),
                kph: (80, 140, 10),
                ids: SpeedIds::Index,
                with_off: false,
            },
            ResolverId::AutoCityModeSpeed => SpeedTable {
                mph: (10, 60, 5),
                kph: (10, 100, 10),
                ids: SpeedIds::Index,
                with_off: false,
            },
            ResolverId::LimitSpeed => SpeedTable {
                mph: (50, 100, 5),
                kph: (80, 160, 10),
                ids: SpeedIds::Literal,
                with_off: true,
            },
        }
    }

    /// Value set for a given unit system
    pub fn values_for(&self, unit: SpeedUnit) -> ValueSet {
        self.table().values(unit)
    }

    /// Compute the value set against the current registry state
    pub fn resolve(&self, registry: &SettingsRegistry) -> ValueSet {
        self.values_for(speed_unit(registry))
    }
}

/// Current speed unit; anything other than an explicit MPH selects KPH
pub fn speed_unit(registry: &SettingsRegistry) -> SpeedUnit {
    match registry.static_value_name(SPEED_UNITS) {
        Some(name) if name == "MPH" => SpeedUnit::Mph,
        _ => SpeedUnit::Kph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_ids() {
        let mph = ResolverId::QuietRideSpeed.values_for(SpeedUnit::Mph);
        assert_eq!(mph.len(), 18);
        assert_eq!(mph[0], Value::new("5mph", 0));
        assert_eq!(mph[17], Value::new("90mph", 17));

        let kph = ResolverId::QuietRideSpeed.values_for(SpeedUnit::Kph);
        assert_eq!(kph.len(), 9);
        assert_eq!(kph[8], Value::new("90kph", 8));
    }

    #[test]
    fn test_limit_speed_literal_ids_with_off() {
        let mph = ResolverId::LimitSpeed.values_for(SpeedUnit::Mph);
        assert_eq!(mph[0], Value::new("Off", 0));
        assert_eq!(mph[1], Value::new("50mph", 50));
        assert_eq!(mph.last(), Some(&Value::new("100mph", 100)));

        let kph = ResolverId::LimitSpeed.values_for(SpeedUnit::Kph);
        assert_eq!(kph.len(), 10);
        assert_eq!(kph.last(), Some(&Value::new("160kph", 160)));
    }

    #[test]
    fn test_value_source_serializes_without_closures() {
        let json = serde_json::to_string(&ValueSource::Dynamic(ResolverId::LimitSpeed)).unwrap();
        assert_eq!(json, r#"{"dynamic":"limitSpeed"}"#);
    }
}
