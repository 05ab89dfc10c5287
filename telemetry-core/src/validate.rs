//! Plausibility checks on a parsed reading. Soft: warnings never reject a reading.

use std::fmt;

use crate::reading::{Field, Reading};

/// Default plausible temperature, °C.
pub const TEMPERATURE_RANGE: Bounds = Bounds::new(0.0, 50.0);
/// Default plausible relative humidity, %.
pub const HUMIDITY_RANGE: Bounds = Bounds::new(20.0, 80.0);
/// Largest temperature change between consecutive readings before warning.
pub const TEMPERATURE_JUMP_THRESHOLD: f32 = 2.0;
/// Largest humidity change between consecutive readings before warning.
pub const HUMIDITY_JUMP_THRESHOLD: f32 = 5.0;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        !(value < self.min || value > self.max)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} - {:.1}", self.min, self.max)
    }
}

/// Validation limits. `Default` gives the reference bounds and thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub temperature: Bounds,
    pub humidity: Bounds,
    pub temperature_jump: f32,
    pub humidity_jump: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE_RANGE,
            humidity: HUMIDITY_RANGE,
            temperature_jump: TEMPERATURE_JUMP_THRESHOLD,
            humidity_jump: HUMIDITY_JUMP_THRESHOLD,
        }
    }
}

/// One soft validation finding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Warning {
    /// Value outside its plausible range.
    OutOfRange {
        field: Field,
        value: f32,
        bounds: Bounds,
    },
    /// Value moved further than the threshold since the sender's previous reading.
    AbruptChange {
        field: Field,
        previous: f32,
        current: f32,
        threshold: f32,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::OutOfRange {
                field: Field::Temperature,
                value,
                bounds,
            } => write!(
                f,
                "Temperature {:.2}°C out of acceptable range ({}°C)",
                value, bounds
            ),
            Warning::OutOfRange {
                field,
                value,
                bounds,
            } => write!(
                f,
                "{} {:.2}% out of acceptable range ({}%)",
                field, value, bounds
            ),
            Warning::AbruptChange {
                field,
                previous,
                current,
                threshold,
            } => write!(
                f,
                "{} changed abruptly from {:.2} to {:.2} (threshold {:.1})",
                field, previous, current, threshold
            ),
        }
    }
}

/// Range checks. Temperature and humidity are checked independently, so a reading
/// yields zero, one or two warnings.
pub fn validate(reading: &Reading, limits: &Limits) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if !limits.temperature.contains(reading.temperature) {
        warnings.push(Warning::OutOfRange {
            field: Field::Temperature,
            value: reading.temperature,
            bounds: limits.temperature,
        });
    }
    if !limits.humidity.contains(reading.humidity) {
        warnings.push(Warning::OutOfRange {
            field: Field::Humidity,
            value: reading.humidity,
            bounds: limits.humidity,
        });
    }
    warnings
}

/// Compare against the sender's previous `(temperature, humidity)`. Only meaningful
/// when the record held a real reading; callers skip the zero sentinel.
pub fn check_change(reading: &Reading, previous: (f32, f32), limits: &Limits) -> Vec<Warning> {
    let (last_temperature, last_humidity) = previous;
    let mut warnings = Vec::new();
    if (reading.temperature - last_temperature).abs() > limits.temperature_jump {
        warnings.push(Warning::AbruptChange {
            field: Field::Temperature,
            previous: last_temperature,
            current: reading.temperature,
            threshold: limits.temperature_jump,
        });
    }
    if (reading.humidity - last_humidity).abs() > limits.humidity_jump {
        warnings.push(Warning::AbruptChange {
            field: Field::Humidity,
            previous: last_humidity,
            current: reading.humidity,
            threshold: limits.humidity_jump,
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f32, humidity: f32) -> Reading {
        Reading {
            qos: 0.0,
            temperature,
            humidity,
        }
    }

    fn warned_fields(warnings: &[Warning]) -> Vec<Field> {
        warnings
            .iter()
            .map(|w| match w {
                Warning::OutOfRange { field, .. } | Warning::AbruptChange { field, .. } => *field,
            })
            .collect()
    }

    #[test]
    fn bounds_are_inclusive() {
        let limits = Limits::default();
        for (t, h) in [(0.0, 20.0), (50.0, 80.0), (23.5, 45.0)] {
            assert!(validate(&reading(t, h), &limits).is_empty(), "{} {}", t, h);
        }
    }

    #[test]
    fn temperature_outside_range_warns() {
        let limits = Limits::default();
        for t in [-0.01, 50.01, -40.0, 120.0] {
            let w = validate(&reading(t, 50.0), &limits);
            assert_eq!(warned_fields(&w), vec![Field::Temperature], "{}", t);
        }
    }

    #[test]
    fn humidity_outside_range_warns() {
        let limits = Limits::default();
        for h in [19.99, 80.01, 0.0, 100.0] {
            let w = validate(&reading(25.0, h), &limits);
            assert_eq!(warned_fields(&w), vec![Field::Humidity], "{}", h);
        }
    }

    #[test]
    fn both_fields_warn_independently() {
        let w = validate(&reading(55.0, 10.0), &Limits::default());
        assert_eq!(w.len(), 2);
        assert_eq!(
            w[0],
            Warning::OutOfRange {
                field: Field::Temperature,
                value: 55.0,
                bounds: TEMPERATURE_RANGE,
            }
        );
        assert_eq!(
            w[1],
            Warning::OutOfRange {
                field: Field::Humidity,
                value: 10.0,
                bounds: HUMIDITY_RANGE,
            }
        );
    }

    #[test]
    fn custom_limits_apply() {
        let limits = Limits {
            temperature: Bounds::new(-10.0, 10.0),
            ..Limits::default()
        };
        assert!(validate(&reading(-5.0, 50.0), &limits).is_empty());
        assert_eq!(validate(&reading(20.0, 50.0), &limits).len(), 1);
    }

    #[test]
    fn abrupt_change_is_strictly_greater_than_threshold() {
        let limits = Limits::default();
        assert!(check_change(&reading(22.0, 45.0), (20.0, 40.0), &limits).is_empty());
        let w = check_change(&reading(22.5, 45.0), (20.0, 40.0), &limits);
        assert_eq!(warned_fields(&w), vec![Field::Temperature]);
        let w = check_change(&reading(17.0, 30.0), (20.0, 40.0), &limits);
        assert_eq!(warned_fields(&w), vec![Field::Temperature, Field::Humidity]);
    }

    #[test]
    fn warnings_render_for_logs() {
        let w = validate(&reading(55.0, 10.0), &Limits::default());
        assert_eq!(
            w[0].to_string(),
            "Temperature 55.00°C out of acceptable range (0.0 - 50.0°C)"
        );
        assert_eq!(
            w[1].to_string(),
            "Humidity 10.00% out of acceptable range (20.0 - 80.0%)"
        );
    }
}
