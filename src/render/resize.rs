// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use image::{imageops, RgbaImage};
use serde_with::DeserializeFromStr;
use tracing::{debug, warn};

use super::settings::RenderSettings;

/// Different resizing methods
#[derive(Copy, Clone, Debug, DeserializeFromStr, PartialEq, Eq)]
pub enum Method {
    /// Nearest neighbor sampling.
    Nearest,

    /// Triangle (aka bilinear) sampling.
    Triangle,

    /// Catmull-Rom (aka bicubic) sampling.
    CatmullRom,

    /// Mitchell-Netravali sampling.
    Mitchell,

    /// Lanczos sampling with a window size of 3.
    Lanczos3,
}

impl Method {
    /// The closest [`imageops`] filter for this method.
    pub(crate) fn filter_type(&self) -> imageops::FilterType {
        match self {
            Method::Nearest => imageops::Nearest,
            Method::Triangle => imageops::Triangle,
            // imageops has no Mitchell filter
            Method::CatmullRom | Method::Mitchell => imageops::CatmullRom,
            Method::Lanczos3 => imageops::Lanczos3,
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Nearest
    }
}

impl FromStr for Method {
    type Err = &'static str;

    /// Names are case-insensitive, and both the filter names and the common names (like
    /// "bilinear" or "bicubic") are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_") as &str {
            "nearest" | "point" => Ok(Method::Nearest),
            "triangle" | "linear" | "bilinear" => Ok(Method::Triangle),
            "catmull_rom" | "catmullrom" | "catrom" | "bicubic" | "cubic" => {
                Ok(Method::CatmullRom)
            }
            "mitchell" => Ok(Method::Mitchell),
            "lanczos" | "lanczos3" | "antialias" => Ok(Method::Lanczos3),
            _ => Err("unknown scaling method"),
        }
    }
}

#[derive(Debug)]
pub enum ResizeError {
    /// When a resizer does not support the requested method.
    UnsupportedMethod,

    /// Other kinds of errors.
    Other(anyhow::Error),
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::UnsupportedMethod => f.write_str("Unsupported resize method given"),
            ResizeError::Other(err) => err.fmt(f),
        }
    }
}

impl StdError for ResizeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ResizeError::UnsupportedMethod => None,
            ResizeError::Other(err) => Some(err.as_ref()),
        }
    }
}

/// Multiply an image dimension by the scale factor, failing instead of overflowing.
fn scaled(length: u32, scale_factor: u32) -> Result<u32, ResizeError> {
    length.checked_mul(scale_factor).ok_or_else(|| {
        ResizeError::Other(anyhow::anyhow!(
            "Enlarging {} pixels by {} overflows",
            length,
            scale_factor
        ))
    })
}

pub(crate) trait Resizer: fmt::Debug {
    /// Enlarge a map of colors by the scale factor given when the resizer was created.
    fn enlarge(&self, colors: &RgbaImage) -> Result<RgbaImage, ResizeError>;
}

/// A resize implementation that can only do nearest neighbor, but it's pretty fast at that.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PointResize(u32);

impl<'a> TryFrom<&'a RenderSettings> for PointResize {
    type Error = ResizeError;

    fn try_from(settings: &'a RenderSettings) -> Result<Self, Self::Error> {
        match settings.scaling_method {
            Method::Nearest => Ok(Self(settings.scale_factor)),
            _ => Err(ResizeError::UnsupportedMethod),
        }
    }
}

impl Resizer for PointResize {
    /// Each input pixel is enlarged to a square `scale_factor` pixels wide by copying a
    /// mono-color view (see [image::flat::FlatSamples::with_monocolor]) onto the output.
    fn enlarge(&self, colors: &RgbaImage) -> Result<RgbaImage, ResizeError> {
        let scale_factor = self.0;
        let mut full_image = RgbaImage::new(
            scaled(colors.width(), scale_factor)?,
            scaled(colors.height(), scale_factor)?,
        );
        for (x, y, pixel) in colors.enumerate_pixels() {
            let tile = image::flat::FlatSamples::with_monocolor(pixel, scale_factor, scale_factor);
            let tile_view = tile
                .as_view()
                .map_err(|err| ResizeError::Other(anyhow::anyhow!("{:?}", err)))?;
            imageops::replace(
                &mut full_image,
                &tile_view,
                x * scale_factor,
                y * scale_factor,
            );
        }
        Ok(full_image)
    }
}

/// A resizer that uses [`image::imageops`].
#[derive(Clone, Debug)]
pub(crate) struct ImageResize {
    scale_factor: u32,
    filter_type: imageops::FilterType,
}

impl<'a> TryFrom<&'a RenderSettings> for ImageResize {
    type Error = ResizeError;

    fn try_from(settings: &'a RenderSettings) -> Result<Self, Self::Error> {
        if settings.scaling_method == Method::Mitchell {
            return Err(ResizeError::UnsupportedMethod);
        }
        Ok(Self {
            scale_factor: settings.scale_factor,
            filter_type: settings.scaling_method.filter_type(),
        })
    }
}

impl Resizer for ImageResize {
    fn enlarge(&self, colors: &RgbaImage) -> Result<RgbaImage, ResizeError> {
        let new_width = scaled(colors.width(), self.scale_factor)?;
        let new_height = scaled(colors.height(), self.scale_factor)?;
        Ok(imageops::resize(
            colors,
            new_width,
            new_height,
            self.filter_type,
        ))
    }
}

#[cfg(feature = "piston_resize")]
mod piston {
    use std::convert::TryFrom;

    use image::RgbaImage;
    use parking_lot::Mutex;
    use resize as piston_resize;
    use rgb::FromSlice;
    use tracing::{debug, warn};

    use super::{Method, ResizeError, Resizer};
    use crate::render::RenderSettings;

    type RgbaResizer = piston_resize::Resizer<piston_resize::formats::RgbaPremultiply<u8, u8>>;

    /// Inner piston resizer state, specifically keeping the [`resize::Resizer`] and dimensions.
    #[derive(Debug)]
    struct ResizerState {
        resizer: RgbaResizer,
        source_width: usize,
        source_height: usize,
    }

    /// A resizer that uses the [`resize`] crate from the Piston project.
    #[derive(Debug)]
    pub(crate) struct PistonResize {
        scale_factor: usize,
        // Not using piston_resize::Type as it has a Custom variant making it non-Send, non-Sync, non-Clone
        method: Method,
        state: Mutex<Option<ResizerState>>,
    }

    impl<'a> TryFrom<&'a RenderSettings> for PistonResize {
        type Error = ResizeError;

        fn try_from(settings: &'a RenderSettings) -> Result<Self, Self::Error> {
            Ok(Self {
                scale_factor: settings.scale_factor as usize,
                method: settings.scaling_method,
                state: Mutex::new(None),
            })
        }
    }

    impl PistonResize {
        fn create_state(
            &self,
            source_width: usize,
            source_height: usize,
        ) -> Result<ResizerState, ResizeError> {
            let filter_type = match self.method {
                Method::Nearest => piston_resize::Type::Point,
                Method::Triangle => piston_resize::Type::Triangle,
                Method::CatmullRom => piston_resize::Type::Catrom,
                Method::Mitchell => piston_resize::Type::Mitchell,
                Method::Lanczos3 => piston_resize::Type::Lanczos3,
            };
            let overflow = || ResizeError::Other(anyhow::anyhow!("Enlarged image is too large"));
            let destination_width = source_width
                .checked_mul(self.scale_factor)
                .ok_or_else(overflow)?;
            let destination_height = source_height
                .checked_mul(self.scale_factor)
                .ok_or_else(overflow)?;
            debug!(
                ?source_width,
                ?source_height,
                ?destination_width,
                ?destination_height,
                "Creating new Piston resizer"
            );
            let resizer = RgbaResizer::new(
                source_width,
                source_height,
                destination_width,
                destination_height,
                piston_resize::Pixel::RGBA8P,
                filter_type,
            )
            .map_err(|err| ResizeError::Other(err.into()))?;
            Ok(ResizerState {
                resizer,
                source_width,
                source_height,
            })
        }
    }

    impl Resizer for PistonResize {
        fn enlarge(&self, colors: &RgbaImage) -> Result<RgbaImage, ResizeError> {
            let source_width = colors.width() as usize;
            let source_height = colors.height() as usize;
            let mut maybe_state = self.state.lock();
            let mut state = match maybe_state.take() {
                Some(state)
                    if state.source_width == source_width
                        && state.source_height == source_height =>
                {
                    state
                }
                Some(_) => {
                    warn!("Thermal image dimensions changed, recreating Piston resizer");
                    self.create_state(source_width, source_height)?
                }
                None => self.create_state(source_width, source_height)?,
            };
            let mut destination = RgbaImage::new(
                (source_width * self.scale_factor) as u32,
                (source_height * self.scale_factor) as u32,
            );
            state
                .resizer
                .resize(colors.as_rgba(), destination.as_rgba_mut())
                .map_err(|err| ResizeError::Other(err.into()))?;
            *maybe_state = Some(state);
            Ok(destination)
        }
    }
}

#[cfg(feature = "piston_resize")]
pub(crate) fn preferred_resizer(
    settings: &RenderSettings,
) -> Result<Box<dyn Resizer + Send + Sync>, ResizeError> {
    if let Ok(resizer) = PointResize::try_from(settings) {
        debug!(method = ?settings.scaling_method, "Using custom point scaling");
        Ok(Box::new(resizer))
    } else if let Ok(resizer) = piston::PistonResize::try_from(settings) {
        debug!(method = ?settings.scaling_method, "Using Piston resize for resizing");
        Ok(Box::new(resizer))
    } else if let Ok(resizer) = ImageResize::try_from(settings) {
        debug!(method = ?settings.scaling_method, "Using image::imageops for resizing");
        Ok(Box::new(resizer))
    } else {
        warn!(method = ?settings.scaling_method, "Unable to find a resizer for requested scaling method");
        Err(ResizeError::UnsupportedMethod)
    }
}

#[cfg(not(feature = "piston_resize"))]
pub(crate) fn preferred_resizer(
    settings: &RenderSettings,
) -> Result<Box<dyn Resizer + Send + Sync>, ResizeError> {
    // Prefer the point resizer, then the imageops resizer
    if let Ok(resizer) = PointResize::try_from(settings) {
        debug!(method = ?settings.scaling_method, "Using custom point scaling");
        Ok(Box::new(resizer))
    } else if let Ok(resizer) = ImageResize::try_from(settings) {
        debug!(method = ?settings.scaling_method, "Using image::imageops for resizing");
        Ok(Box::new(resizer))
    } else {
        warn!(method = ?settings.scaling_method, "Unable to find a resizer for requested scaling method");
        Err(ResizeError::UnsupportedMethod)
    }
}

/// Scale an image to `height` pixels tall, keeping the aspect ratio.
pub(crate) fn fit_height(image: RgbaImage, height: u32, method: Method) -> RgbaImage {
    if image.height() == height || image.height() == 0 {
        return image;
    }
    let width = (height as u64 * image.width() as u64 / image.height() as u64).max(1) as u32;
    imageops::resize(&image, width, height, method.filter_type())
}
