//! Value sets shared by several settings, and generators for numeric ranges

use serde::{Deserialize, Serialize};

/// One discrete choice of a setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub name: String,
    pub id: u8,
}

impl Value {
    pub fn new(name: impl Into<String>, id: u8) -> Self {
        Value {
            name: name.into(),
            id,
        }
    }
}

/// Ordered catalog of the choices a setting may hold.
pub type ValueSet = Vec<Value>;

/// Build a value set from `(name, id)` pairs
pub fn values(pairs: &[(&str, u8)]) -> ValueSet {
    pairs
        .iter()
        .map(|(name, id)| Value::new(*name, *id))
        .collect()
}

/// Build a value set from names, numbered from zero
pub fn enumerated(names: &[&str]) -> ValueSet {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| Value::new(*name, id as u8))
        .collect()
}

/// Inclusive stepped range, `start..=end` by `step`.
///
/// A zero step yields an empty range.
pub fn step_range(start: u32, end: u32, step: u32) -> Vec<u32> {
    if step == 0 {
        return Vec::new();
    }
    (start..=end).step_by(step as usize).collect()
}

/// Slider-style values: labels are the stepped numbers, ids are the positions.
///
/// `slider_range(30, 100, 10, "%")` gives `30%`=0, `40%`=1 ... `100%`=7.
pub fn slider_range(min: u32, max: u32, step: u32, suffix: &str) -> ValueSet {
    step_range(min, max, step)
        .into_iter()
        .enumerate()
        .map(|(idx, v)| Value::new(format!("{}{}", v, suffix), idx as u8))
        .collect()
}

pub fn boolean() -> ValueSet {
    values(&[("False", 0), ("True", 1)])
}

pub fn colors() -> ValueSet {
    enumerated(&[
        "Blue", "Amber", "Green", "Pink", "Gray", "Red", "White", "Purple",
    ])
}

/// Band colors: like [`colors`] but with "Signal strength" in front
pub fn band_colors() -> ValueSet {
    enumerated(&[
        "Signal strength",
        "Blue",
        "Amber",
        "Green",
        "Pink",
        "Gray",
        "Red",
        "White",
        "Purple",
    ])
}

pub fn tones() -> ValueSet {
    (0..12u8)
        .map(|id| Value::new(format!("TONE_{}", id + 1), id))
        .collect()
}

pub fn off_on_weak() -> ValueSet {
    enumerated(&["OFF", "ON", "WEAK"])
}

pub fn mute_memory() -> ValueSet {
    enumerated(&["X_K", "X_K_KA"])
}

pub fn alerts_priority() -> ValueSet {
    enumerated(&["SIGNAL", "KA_MRCD", "MRCD_KA"])
}

pub fn left_display() -> ValueSet {
    enumerated(&[
        "SPEED",
        "SPEED_COMPASS",
        "COMPASS",
        "VOLTAGE",
        "ALTITUDE",
    ])
}

/// Brightness levels; the "dim" style menus only offer the upper three
pub fn brightness(levels: &[&str]) -> ValueSet {
    enumerated(levels)
}

/// Clock times in quarter hours, labelled `T_h_mm`
pub fn quarter_hours(from_minutes: u32, to_minutes: u32) -> ValueSet {
    step_range(from_minutes, to_minutes, 15)
        .into_iter()
        .enumerate()
        .map(|(idx, m)| {
            Value::new(format!("T_{}_{:02}", m / 60, m % 60), idx as u8)
        })
        .collect()
}

/// `GMT-12` ... `GMT` ... `GMT+12`, ids 0..=24
pub fn time_zones() -> ValueSet {
    (-12i32..=12)
        .enumerate()
        .map(|(idx, offset)| {
            Value::new(time_zone_label(offset), idx as u8)
        })
        .collect()
}

/// Label used by the "Time zone" setting for a whole-hour UTC offset
pub fn time_zone_label(offset_hours: i32) -> String {
    match offset_hours {
        0 => "GMT".to_string(),
        h => format!("GMT{:+}", h),
    }
}

/// Split of user and manufacturer memory, 1750/250 down to 250/1750
pub fn memory_quota() -> ValueSet {
    (0..=30u8)
        .map(|idx| {
            let user = 1750 - 50 * idx as u32;
            Value::new(format!("UM_MM_{}_{}", user, 2000 - user), idx)
        })
        .collect()
}

pub fn detector_volume() -> ValueSet {
    let mut set = vec![Value::new("Always Muted", 0)];
    set.extend((1..=8u8).map(|v| Value::new(v.to_string(), v)));
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_range_is_inclusive() {
        assert_eq!(step_range(5, 20, 5), vec![5, 10, 15, 20]);
        assert_eq!(
            step_range(10, 95, 10),
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90]
        );
        assert!(step_range(1, 10, 0).is_empty());
    }

    #[test]
    fn test_slider_range_ids_are_positions() {
        let set = slider_range(30, 100, 10, "%");
        assert_eq!(set.len(), 8);
        assert_eq!(set[0], Value::new("30%", 0));
        assert_eq!(set[7], Value::new("100%", 7));
    }

    #[test]
    fn test_time_zones() {
        let set = time_zones();
        assert_eq!(set.len(), 25);
        assert_eq!(set[0], Value::new("GMT-12", 0));
        assert_eq!(set[12], Value::new("GMT", 12));
        assert_eq!(set[13], Value::new("GMT+1", 13));
        assert_eq!(set[24], Value::new("GMT+12", 24));
    }

    #[test]
    fn test_quarter_hours() {
        let set = quarter_hours(5 * 60 + 30, 7 * 60 + 30);
        assert_eq!(set.len(), 9);
        assert_eq!(set[0].name, "T_5_30");
        assert_eq!(set[2].name, "T_6_00");
        assert_eq!(set[8], Value::new("T_7_30", 8));
    }

    #[test]
    fn test_memory_quota() {
        let set = memory_quota();
        assert_eq!(set.len(), 31);
        assert_eq!(set[0].name, "UM_MM_1750_250");
        assert_eq!(set[15].name, "UM_MM_1000_1000");
        assert_eq!(set[30].name, "UM_MM_250_1750");
    }

    #[test]
    fn test_tones_and_volume() {
        assert_eq!(tones()[11], Value::new("TONE_12", 11));
        let volume = detector_volume();
        assert_eq!(volume[0].name, "Always Muted");
        assert_eq!(volume[8], Value::new("8", 8));
    }
}
