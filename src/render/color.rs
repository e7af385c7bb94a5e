// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::From;
use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde_with::DeserializeFromStr;

use crate::settings::gradient;

/// An opaque 8-bit RGB color.
///
/// This type can be formatted as a hex code using the standard formatting syntax. The formatted
/// output will have a leading '#'.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl From<colorous::Color> for Color {
    fn from(other_color: colorous::Color) -> Self {
        Color {
            red: other_color.r,
            green: other_color.g,
            blue: other_color.b,
        }
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        color.as_array()
    }
}

impl From<Color> for (u8, u8, u8) {
    fn from(color: Color) -> Self {
        color.as_tuple()
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.red, color.green, color.blue, u8::MAX])
    }
}

impl fmt::UpperHex for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            self.red(),
            self.green(),
            self.blue()
        )
    }
}

impl Color {
    pub const BLACK: Self = Self {
        red: u8::MIN,
        green: u8::MIN,
        blue: u8::MIN,
    };

    pub const WHITE: Self = Self {
        red: u8::MAX,
        green: u8::MAX,
        blue: u8::MAX,
    };

    pub const RED: Self = Self {
        red: u8::MAX,
        green: u8::MIN,
        blue: u8::MIN,
    };

    /// Create a new [Color] with the given 8-bit color values.
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// The red, green, and blue components as a 3-tuple.
    pub fn as_tuple(&self) -> (u8, u8, u8) {
        (self.red(), self.green(), self.blue())
    }

    /// The red, green, and blue components as a 3 element array.
    pub fn as_array(&self) -> [u8; 3] {
        [self.red(), self.green(), self.blue()]
    }
}

/// Where `value` falls between `min` and `max`, clamped to `[0, 1]`. NaN maps to 0.
fn normalize(value: f32, min: f32, max: f32) -> f64 {
    let normalized = (value as f64 - min as f64) / (max as f64 - min as f64);
    if normalized.is_nan() {
        0.0
    } else {
        normalized.max(0.0).min(1.0)
    }
}

/// Map a temperature onto the thermal gradient: black, blue, green, yellow, red, then white.
///
/// The gradient is split into five equal segments, and channel values are truncated. If `min`
/// and `max` are equal every value is white.
pub fn map_to_color(value: f32, min: f32, max: f32) -> Color {
    if min == max {
        return Color::WHITE;
    }
    // Working on a 0-5 scale keeps both ends of the gradient exact.
    let position = normalize(value, min, max) * 5.0;
    let segment = (position.floor() as u8).min(4);
    let fraction = position - segment as f64;
    let ramp = (255.0 * fraction) as u8;
    match segment {
        0 => Color::new(0, 0, ramp),
        1 => Color::new(0, ramp, 255 - ramp),
        2 => Color::new(ramp, 255, 0),
        3 => Color::new(255, (255.0 * (1.0 - fraction)) as u8, 0),
        _ => Color::new(255, ramp, ramp),
    }
}

/// The color scheme used for rendering a frame.
#[derive(Clone, Copy, Debug, DeserializeFromStr)]
pub enum Palette {
    /// The built in black-blue-green-yellow-red-white gradient.
    Thermal,

    /// A gradient from [colorous].
    Gradient(colorous::Gradient),
}

impl Palette {
    pub fn color(&self, value: f32, min: f32, max: f32) -> Color {
        match self {
            Self::Thermal => map_to_color(value, min, max),
            Self::Gradient(gradient) => {
                let normalized = if min == max {
                    1.0
                } else {
                    normalize(value, min, max)
                };
                Color::from(gradient.eval_continuous(normalized))
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::Thermal
    }
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Thermal, Self::Thermal) => true,
            // colorous::Gradient doesn't implement PartialEq
            (Self::Gradient(left), Self::Gradient(right)) => {
                format!("{:?}", left) == format!("{:?}", right)
            }
            _ => false,
        }
    }
}

impl FromStr for Palette {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("thermal") {
            Ok(Self::Thermal)
        } else {
            gradient::from_str(s).map(Self::Gradient)
        }
    }
}
