// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

use crate::temperature::TemperatureUnit;

use super::color::Palette;
use super::resize::Method;

const MAXIMUM_SCALE_FACTOR: u32 = 100;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RenderSettings {
    /// The size (in pixels) each thermal pixel is enlarged to before the overlay is drawn.
    #[serde(default = "RenderSettings::default_scale_factor", alias = "grid_size")]
    pub scale_factor: u32,

    #[serde(default, alias = "resample")]
    pub scaling_method: Method,

    /// The height of the final image. The width is scaled to keep the aspect ratio.
    #[serde(default = "RenderSettings::default_height", alias = "desired_height")]
    pub height: u32,

    /// A TrueType font for the labels. Common system locations for DejaVu Sans are tried if this
    /// is not set.
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    #[serde(default = "RenderSettings::default_font_size")]
    pub font_size: f32,

    #[serde(default)]
    pub units: TemperatureUnit,

    #[serde(default)]
    pub colors: Palette,

    #[serde(default = "RenderSettings::default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl RenderSettings {
    fn default_scale_factor() -> u32 {
        20
    }

    fn default_height() -> u32 {
        480
    }

    fn default_font_size() -> f32 {
        30.0
    }

    fn default_jpeg_quality() -> u8 {
        75
    }

    /// Check for values that can't be rendered.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.scale_factor == 0 || self.scale_factor > MAXIMUM_SCALE_FACTOR {
            Err("scale_factor must be between 1 and 100")
        } else if self.height == 0 {
            Err("height must be at least 1")
        } else if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            Err("jpeg_quality must be between 1 and 100")
        } else if !(self.font_size > 0.0) {
            Err("font_size must be positive")
        } else {
            Ok(())
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale_factor: Self::default_scale_factor(),
            scaling_method: Method::default(),
            height: Self::default_height(),
            font_path: None,
            font_size: Self::default_font_size(),
            units: TemperatureUnit::default(),
            colors: Palette::default(),
            jpeg_quality: Self::default_jpeg_quality(),
        }
    }
}
