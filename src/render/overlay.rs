// SPDX-License-Identifier: GPL-3.0-or-later
//! Annotations drawn on top of the enlarged thermal image.
use image::{GrayImage, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::color::{Color, Palette};

const RETICLE_RADIUS: i32 = 9;
const RETICLE_RING_INSET: i32 = 2;

const SHADOW_OFFSET: i32 = 5;
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 100]);
const OUTLINE_WIDTH: i32 = 2;

const BAR_WIDTH: u32 = 10;
const BAR_MARGIN: u32 = 10;
/// How far left of the scale bar the scale labels start.
const SCALE_LABEL_OFFSET: i32 = 95;
/// How far the minimum label is raised from the bottom of the scale bar.
const MIN_LABEL_RAISE: i32 = 40;
/// How far the hot spot label is raised when it is drawn above the reticle.
const HOT_LABEL_RAISE: i32 = 50;
/// Hot spots in this many rows from the bottom have their label drawn above the reticle.
const BOTTOM_ROWS: usize = 3;

/// Where the scale bar was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScaleBar {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) height: u32,
}

impl ScaleBar {
    /// The bar runs down the right edge, inset by a margin on every side.
    pub(crate) fn for_image(width: u32, height: u32) -> Option<Self> {
        let bar_height = height.checked_sub(2 * BAR_MARGIN).filter(|h| *h > 0)?;
        let x = width.checked_sub(BAR_WIDTH + BAR_MARGIN)?;
        Some(Self {
            x,
            y: BAR_MARGIN,
            height: bar_height,
        })
    }

    fn label_x(&self) -> i32 {
        self.x as i32 - SCALE_LABEL_OFFSET
    }

    pub(crate) fn max_label_y(&self) -> i32 {
        self.y as i32
    }

    pub(crate) fn min_label_y(&self) -> i32 {
        (self.y + self.height) as i32 - MIN_LABEL_RAISE
    }

    pub(crate) fn average_label_y(&self) -> i32 {
        ((self.y + self.height) / 2) as i32
    }
}

/// Crosshairs with a ring around them, centered on `(x, y)`.
pub(crate) fn draw_reticle(image: &mut RgbaImage, x: i32, y: i32) {
    let red = Rgba::from(Color::RED);
    let (xf, yf) = (x as f32, y as f32);
    let radius = RETICLE_RADIUS as f32;
    draw_line_segment_mut(image, (xf, yf - radius), (xf, yf + radius), red);
    draw_line_segment_mut(image, (xf - radius, yf), (xf + radius, yf), red);
    draw_hollow_circle_mut(image, (x, y), RETICLE_RADIUS - RETICLE_RING_INSET, red);
}

/// Blend a solid color over a rectangle, clipped to the image.
fn blend_rect(image: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
    let x_start = x.max(0) as u32;
    let y_start = y.max(0) as u32;
    let x_end = ((x + width as i32).max(0) as u32).min(image.width());
    let y_end = ((y + height as i32).max(0) as u32).min(image.height());
    for row in y_start..y_end {
        for column in x_start..x_end {
            image.get_pixel_mut(column, row).blend(&color);
        }
    }
}

/// Blend `color` onto the image, using the mask as opacity, with the mask's top left corner at
/// `(x, y)`.
fn stamp_mask(image: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32, color: Rgba<u8>) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    for (mask_x, mask_y, coverage) in mask.enumerate_pixels() {
        let coverage = coverage.0[0];
        if coverage == 0 {
            continue;
        }
        let column = x + mask_x as i32;
        let row = y + mask_y as i32;
        if column < 0 || row < 0 || column >= width || row >= height {
            continue;
        }
        let mut text_color = color;
        text_color.channels_mut()[3] = (color.0[3] as u16 * coverage as u16 / 255) as u8;
        image
            .get_pixel_mut(column as u32, row as u32)
            .blend(&text_color);
    }
}

/// Draw white text with a black outline and a translucent drop shadow.
pub(crate) fn draw_label(image: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32) {
    stamp_mask(image, mask, x + SHADOW_OFFSET, y + SHADOW_OFFSET, SHADOW);
    let black = Rgba::from(Color::BLACK);
    for dx in -OUTLINE_WIDTH..=OUTLINE_WIDTH {
        for dy in -OUTLINE_WIDTH..=OUTLINE_WIDTH {
            if dx != 0 || dy != 0 {
                stamp_mask(image, mask, x + dx, y + dy, black);
            }
        }
    }
    stamp_mask(image, mask, x, y, Rgba::from(Color::WHITE));
}

/// Draw the color scale, hottest at the top, with its shadow.
pub(crate) fn draw_scale_bar(image: &mut RgbaImage, bar: ScaleBar, palette: &Palette, min: f32, max: f32) {
    blend_rect(
        image,
        bar.x as i32 + SHADOW_OFFSET,
        bar.y as i32 + SHADOW_OFFSET,
        BAR_WIDTH + 1,
        bar.height + 1,
        SHADOW,
    );
    for step in 0..bar.height {
        let fraction = (bar.height - step - 1) as f32 / bar.height as f32;
        let value = min + (max - min) * fraction;
        let color = palette.color(value, min, max);
        draw_filled_rect_mut(
            image,
            Rect::at(bar.x as i32, (bar.y + step) as i32).of_size(BAR_WIDTH + 1, 1),
            Rgba::from(color),
        );
    }
}

/// Draw the maximum, average and minimum labels to the left of the scale bar.
pub(crate) fn draw_scale_labels(
    image: &mut RgbaImage,
    bar: ScaleBar,
    max_label: &GrayImage,
    average_label: &GrayImage,
    min_label: &GrayImage,
) {
    draw_label(image, max_label, bar.label_x(), bar.max_label_y());
    draw_label(image, min_label, bar.label_x(), bar.min_label_y());
    draw_label(image, average_label, bar.label_x(), bar.average_label_y());
}

/// Find where the hot spot label goes for a reticle at `(center_x, center_y)`.
///
/// The label goes below the reticle unless the hot spot is in one of the bottom rows, in which
/// case it goes above. It is kept inside the right edge of the image.
pub(crate) fn hot_label_position(
    image_size: (u32, u32),
    label_width: u32,
    center: (i32, i32),
    hot_row: usize,
    rows: usize,
) -> (i32, i32) {
    let (width, height) = (image_size.0 as i32, image_size.1 as i32);
    let (center_x, center_y) = center;
    let y = if hot_row + BOTTOM_ROWS >= rows {
        (center_y - HOT_LABEL_RAISE).max(0)
    } else {
        (center_y + RETICLE_RADIUS).min(height)
    };
    let x = center_x.max(0).min(width - label_width as i32).max(0);
    (x, y)
}
