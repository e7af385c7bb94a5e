// SPDX-License-Identifier: GPL-3.0-or-later
//! Turning thermal frames into annotated false-color JPEG images.
use std::fmt;

use bytes::Bytes;
use image::{Pixel, RgbImage, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::RenderError;
use crate::image_buffer::{hottest_point, thermal_image};
use crate::source::FrameRecord;
use crate::temperature::{Temperature, TemperatureUnit};

#[cfg(feature = "render_fontdue")]
mod cheese;
pub mod color;
mod font;
mod jpeg;
mod overlay;
mod resize;
mod settings;

pub use color::{map_to_color, Color, Palette};
pub use resize::{Method, ResizeError};
pub use settings::RenderSettings;

use font::FontRenderer;
use overlay::ScaleBar;
use resize::Resizer;

/// Whether a frame shows something warm moving through it: the hottest point is more than
/// `threshold` degrees above the average.
pub fn is_motion(max: f32, avg: f32, threshold: f32) -> bool {
    (max - avg) > threshold
}

/// A digest of the temperatures in a frame, used to skip rendering identical frames.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// SHA-256 of the big-endian bytes of every value.
    pub fn of(values: &[f32]) -> Self {
        let mut hasher = Sha256::new();
        for value in values {
            hasher.update(value.to_be_bytes());
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Self(digest)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fingerprint(")?;
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("…)")
    }
}

/// An encoded JPEG, and the fingerprint of the frame it was rendered from.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedImage {
    pub jpeg: Bytes,
    pub fingerprint: Fingerprint,
    pub width: u32,
    pub height: u32,
}

/// Renders frames with a fixed set of [`RenderSettings`].
///
/// Rendering does no I/O and takes `&self`, so one renderer can be shared between threads. It
/// is CPU heavy though, and should be run on a blocking thread from async code.
#[derive(Debug)]
pub struct FrameRenderer {
    settings: RenderSettings,
    resizer: Box<dyn Resizer + Send + Sync>,
    font: Option<Box<dyn FontRenderer + Send + Sync>>,
}

impl FrameRenderer {
    /// Create a renderer, loading the label font if one is available.
    pub fn new(settings: &RenderSettings) -> Result<Self, RenderError> {
        let mut renderer = Self::without_labels(settings)?;
        renderer.font = font::load_renderer(settings);
        Ok(renderer)
    }

    /// Create a renderer that draws the reticle and scale bar but no text.
    pub fn without_labels(settings: &RenderSettings) -> Result<Self, RenderError> {
        settings.validate().map_err(RenderError::Settings)?;
        let resizer = resize::preferred_resizer(settings)?;
        Ok(Self {
            settings: settings.clone(),
            resizer,
            font: None,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn has_labels(&self) -> bool {
        self.font.is_some()
    }

    fn label(&self, celsius: f32) -> Option<std::sync::Arc<image::GrayImage>> {
        let units: &TemperatureUnit = &self.settings.units;
        let text = format!("{:#.1}", Temperature::Celsius(celsius).as_unit(units));
        self.font.as_ref().map(|font| font.render_text(&text))
    }

    /// Render a record's values and statistics.
    pub fn render(&self, record: &FrameRecord) -> Result<RenderedImage, RenderError> {
        self.render_values(
            &record.values,
            record.min_value,
            record.max_value,
            record.avg_value,
            record.rows,
            record.cols,
        )
    }

    /// Render a grid of `rows` by `cols` temperatures in row-major order.
    ///
    /// Colors are scaled between `min` and `max`. The hottest point is marked with a reticle and
    /// labelled, and a color scale labelled with `max`, `avg` and `min` is drawn on the right.
    pub fn render_values(
        &self,
        values: &[f32],
        min: f32,
        max: f32,
        avg: f32,
        rows: usize,
        cols: usize,
    ) -> Result<RenderedImage, RenderError> {
        let rgba = self.render_rgba(values, min, max, avg, rows, cols)?;
        let rgb = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            rgba.get_pixel(x, y).to_rgb()
        });
        let jpeg = jpeg::encode_jpeg(&rgb, self.settings.jpeg_quality)?;
        trace!(bytes = jpeg.len(), "Encoded frame");
        Ok(RenderedImage {
            jpeg,
            fingerprint: Fingerprint::of(values),
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Everything up to JPEG encoding.
    fn render_rgba(
        &self,
        values: &[f32],
        min: f32,
        max: f32,
        avg: f32,
        rows: usize,
        cols: usize,
    ) -> Result<RgbaImage, RenderError> {
        let temperatures = thermal_image(values, rows, cols)?;
        let palette = &self.settings.colors;
        let colors = RgbaImage::from_fn(temperatures.width(), temperatures.height(), |x, y| {
            palette
                .color(temperatures.get_pixel(x, y).0[0], min, max)
                .into()
        });
        let mut image = self.resizer.enlarge(&colors)?;
        let scale_factor = self.settings.scale_factor as f32;

        let hot_spot = hottest_point(&temperatures).map(|(hot_x, hot_y, hot_value)| {
            let center_x = ((hot_x as f32 + 0.5) * scale_factor) as i32;
            let center_y = ((hot_y as f32 + 0.5) * scale_factor) as i32;
            overlay::draw_reticle(&mut image, center_x, center_y);
            (center_x, center_y, hot_y as usize, hot_value)
        });

        if let Some(bar) = ScaleBar::for_image(image.width(), image.height()) {
            overlay::draw_scale_bar(&mut image, bar, palette, min, max);
            if let (Some(max_label), Some(avg_label), Some(min_label)) =
                (self.label(max), self.label(avg), self.label(min))
            {
                overlay::draw_scale_labels(&mut image, bar, &max_label, &avg_label, &min_label);
            }
        } else {
            debug!(
                width = image.width(),
                height = image.height(),
                "Image too small for a scale bar"
            );
        }

        // The hot spot label goes over the scale bar.
        if let Some((center_x, center_y, hot_row, hot_value)) = hot_spot {
            if let Some(label) = self.label(hot_value) {
                let (x, y) = overlay::hot_label_position(
                    image.dimensions(),
                    label.width(),
                    (center_x, center_y),
                    hot_row,
                    rows,
                );
                overlay::draw_label(&mut image, &label, x, y);
            }
        }

        Ok(resize::fit_height(
            image,
            self.settings.height,
            self.settings.scaling_method,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::{is_motion, Fingerprint, FrameRenderer, RenderSettings};
    use crate::error::RenderError;
    use crate::render::{Color, Method, Palette};
    use crate::render::font::FontRenderer;
    use crate::source::FrameRecord;
    use image::{GrayImage, Luma, Rgba};
    use std::sync::Arc;

    /// Every label is a solid white block.
    #[derive(Debug)]
    struct BlockLabels;

    impl FontRenderer for BlockLabels {
        fn render_text(&self, _text: &str) -> Arc<GrayImage> {
            Arc::new(GrayImage::from_pixel(60, 20, Luma([255])))
        }
    }

    fn renderer(settings: RenderSettings) -> FrameRenderer {
        FrameRenderer::without_labels(&settings).unwrap()
    }

    fn ramp(rows: usize, cols: usize) -> FrameRecord {
        let values = (0..rows * cols).map(|n| 20.0 + n as f32 / 10.0).collect();
        FrameRecord::from_values(values, rows, cols)
    }

    #[test]
    fn motion_threshold() {
        assert!(is_motion(30.0, 21.0, 8.0));
        assert!(!is_motion(29.0, 21.0, 8.0));
        assert!(!is_motion(0.0, 0.0, 8.0));
    }

    #[test]
    fn fingerprint_identity() {
        assert_eq!(Fingerprint::of(&[1.0, 2.0]), Fingerprint::of(&[1.0, 2.0]));
        assert_ne!(Fingerprint::of(&[1.0, 2.0]), Fingerprint::of(&[2.0, 1.0]));
        assert_ne!(Fingerprint::of(&[0.0]), Fingerprint::of(&[-0.0]));
    }

    #[test]
    fn zeros_render() {
        let record = FrameRecord {
            values: vec![0.0; 24 * 32],
            min_value: 0.0,
            max_value: 0.0,
            avg_value: 0.0,
            rows: 24,
            cols: 32,
        };
        let image = renderer(RenderSettings::default()).render(&record).unwrap();
        assert_eq!((image.width, image.height), (640, 480));
        assert_eq!(&image.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn idempotent() {
        let record = ramp(24, 32);
        let renderer = renderer(RenderSettings::default());
        let first = renderer.render(&record).unwrap();
        let second = renderer.render(&record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn target_height() {
        let settings = RenderSettings {
            height: 240,
            ..RenderSettings::default()
        };
        let image = renderer(settings).render(&ramp(24, 32)).unwrap();
        assert_eq!((image.width, image.height), (320, 240));
    }

    #[test]
    fn other_methods() {
        let settings = RenderSettings {
            scaling_method: Method::Triangle,
            scale_factor: 10,
            height: 80,
            ..RenderSettings::default()
        };
        let image = renderer(settings).render(&ramp(8, 8)).unwrap();
        assert_eq!((image.width, image.height), (80, 80));
    }

    #[test]
    fn wrong_shape_rejected() {
        let record = FrameRecord::from_values(vec![1.0; 10], 24, 32);
        let res = renderer(RenderSettings::default()).render(&record);
        assert!(matches!(res, Err(RenderError::Shape { actual: 10, .. })));
    }

    #[test]
    fn invalid_settings_rejected() {
        let settings = RenderSettings {
            jpeg_quality: 0,
            ..RenderSettings::default()
        };
        assert!(matches!(
            FrameRenderer::without_labels(&settings),
            Err(RenderError::Settings(_))
        ));
    }

    #[test]
    fn reticle_on_hottest_cell() {
        let mut values = vec![20.0; 24 * 32];
        // Row 5, column 10
        values[5 * 32 + 10] = 35.0;
        let record = FrameRecord::from_values(values, 24, 32);
        let renderer = renderer(RenderSettings::default());
        let image = renderer
            .render_rgba(
                &record.values,
                record.min_value,
                record.max_value,
                record.avg_value,
                24,
                32,
            )
            .unwrap();
        let red = Rgba::from(Color::RED);
        // Center is (210, 110), the crosshair extends 9 pixels.
        assert_eq!(image.get_pixel(210, 101), &red);
        assert_eq!(image.get_pixel(201, 110), &red);
        // Cold cells away from the overlay are black.
        assert_eq!(image.get_pixel(30, 300), &Rgba::from(Color::BLACK));
    }

    #[test]
    fn gradient_palette() {
        let settings = RenderSettings {
            colors: Palette::Gradient(colorous::VIRIDIS),
            ..RenderSettings::default()
        };
        let record = ramp(4, 4);
        let image = renderer(settings).render(&record).unwrap();
        assert_eq!(image.height, 480);
    }

    #[test]
    fn hot_label_over_scale_bar() {
        let mut values = vec![20.0; 24 * 32];
        // Row 5, last column, so the label is pushed against the right edge.
        values[5 * 32 + 31] = 35.0;
        let record = FrameRecord::from_values(values, 24, 32);
        let renderer = FrameRenderer {
            font: Some(Box::new(BlockLabels)),
            ..renderer(RenderSettings::default())
        };
        let image = renderer
            .render_rgba(
                &record.values,
                record.min_value,
                record.max_value,
                record.avg_value,
                24,
                32,
            )
            .unwrap();
        // The label spans x 580..640 and y 119..139, the bar spans x 620..630.
        assert_eq!(image.get_pixel(625, 130), &Rgba::from(Color::WHITE));
    }
}
