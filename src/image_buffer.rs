// SPDX-License-Identifier: GPL-3.0-or-later
use image::{ImageBuffer, Luma};

use crate::error::RenderError;

/// Images where each point is a temperature in degrees Celsius.
pub type ThermalImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Arrange row-major temperatures into a [`ThermalImage`] `cols` wide and `rows` tall.
pub(crate) fn thermal_image(
    values: &[f32],
    rows: usize,
    cols: usize,
) -> Result<ThermalImage, RenderError> {
    let expected = rows * cols;
    if expected == 0 || values.len() != expected {
        return Err(RenderError::Shape {
            rows,
            cols,
            actual: values.len(),
        });
    }
    ThermalImage::from_raw(cols as u32, rows as u32, values.to_vec()).ok_or(RenderError::Shape {
        rows,
        cols,
        actual: values.len(),
    })
}

/// The position of the hottest point as `(column, row)`, ignoring NaN. Ties go to the first
/// point in row-major order.
pub(crate) fn hottest_point(image: &ThermalImage) -> Option<(u32, u32, f32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| !pixel.0[0].is_nan())
        .fold(None, |hottest, (x, y, pixel)| match hottest {
            Some((_, _, max)) if max >= pixel.0[0] => hottest,
            _ => Some((x, y, pixel.0[0])),
        })
}
