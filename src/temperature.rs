// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The unit temperatures are displayed in. Values coming from a thermal source are always in
/// Celsius.
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[serde(alias = "c", alias = "C")]
    Celsius,

    #[serde(alias = "f", alias = "F")]
    Fahrenheit,
}

impl Default for TemperatureUnit {
    fn default() -> Self {
        Self::Celsius
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        })
    }
}

impl FromStr for TemperatureUnit {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_ascii_lowercase() as &str {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err("unknown temperature unit"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Temperature {
    Celsius(f32),
    Fahrenheit(f32),
}

impl Temperature {
    /// Get the temperature in Celsius.
    pub fn in_celsius(&self) -> f32 {
        match self {
            Self::Celsius(c) => *c,
            Self::Fahrenheit(f) => (f - 32.0) * 5.0 / 9.0,
        }
    }

    /// Get the temperature in Fahrenheit.
    pub fn in_fahrenheit(&self) -> f32 {
        match self {
            Self::Celsius(c) => c * 1.8 + 32.0,
            Self::Fahrenheit(f) => *f,
        }
    }

    pub fn in_unit(&self, unit: &TemperatureUnit) -> f32 {
        match unit {
            TemperatureUnit::Celsius => self.in_celsius(),
            TemperatureUnit::Fahrenheit => self.in_fahrenheit(),
        }
    }

    pub fn as_unit(self, unit: &TemperatureUnit) -> Self {
        match unit {
            TemperatureUnit::Celsius => Self::Celsius(self.in_celsius()),
            TemperatureUnit::Fahrenheit => Self::Fahrenheit(self.in_fahrenheit()),
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        match self {
            Temperature::Celsius(_) => TemperatureUnit::Celsius,
            Temperature::Fahrenheit(_) => TemperatureUnit::Fahrenheit,
        }
    }

    fn value(&self) -> f32 {
        match self {
            Temperature::Celsius(c) => *c,
            Temperature::Fahrenheit(f) => *f,
        }
    }
}

impl fmt::Display for Temperature {
    /// Format the temperature like a plain number. With the alternate flag (`#`) the degree
    /// symbol is appended, and the unit is appended as well for Fahrenheit. Overlay labels use
    /// `{:#.1}`, giving "21.5°" or "70.7°F".
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value(), fmt)?;
        if fmt.alternate() {
            fmt.write_str("°")?;
            if self.unit() == TemperatureUnit::Fahrenheit {
                write!(fmt, "{}", self.unit())?;
            }
        }
        Ok(())
    }
}

impl From<f32> for Temperature {
    fn from(value: f32) -> Self {
        Self::Celsius(value)
    }
}

#[cfg(test)]
mod test {
    use super::{Temperature, TemperatureUnit};
    use float_cmp::approx_eq;

    #[test]
    fn celsius_to_fahrenheit() {
        let t = Temperature::Celsius(100.0);
        assert!(approx_eq!(f32, t.in_fahrenheit(), 212.0, epsilon = 0.001));
        let t = Temperature::Celsius(-40.0);
        assert!(approx_eq!(f32, t.in_fahrenheit(), -40.0, epsilon = 0.001));
    }

    #[test]
    fn fahrenheit_to_celsius() {
        let t = Temperature::Fahrenheit(32.0);
        assert!(approx_eq!(f32, t.in_celsius(), 0.0, epsilon = 0.001));
    }

    #[test]
    fn as_unit_changes_variant() {
        let t = Temperature::Celsius(0.0).as_unit(&TemperatureUnit::Fahrenheit);
        assert_eq!(t.unit(), TemperatureUnit::Fahrenheit);
        assert!(approx_eq!(f32, t.in_fahrenheit(), 32.0, epsilon = 0.001));
    }

    #[test]
    fn display_label() {
        assert_eq!(format!("{:#.1}", Temperature::Celsius(42.54)), "42.5°");
        assert_eq!(format!("{:.1}", Temperature::Celsius(42.54)), "42.5");
        assert_eq!(format!("{:#.1}", Temperature::Fahrenheit(70.0)), "70.0°F");
    }

    #[test]
    fn unit_from_str() {
        assert_eq!("C".parse(), Ok(TemperatureUnit::Celsius));
        assert_eq!("fahrenheit".parse(), Ok(TemperatureUnit::Fahrenheit));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn unit_deserialize() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            units: TemperatureUnit,
        }
        let parsed: Wrapper = toml::from_str("units = \"fahrenheit\"").unwrap();
        assert_eq!(parsed.units, TemperatureUnit::Fahrenheit);
        let parsed: Wrapper = toml::from_str("units = \"c\"").unwrap();
        assert_eq!(parsed.units, TemperatureUnit::Celsius);
    }
}
