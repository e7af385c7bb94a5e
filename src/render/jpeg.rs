// SPDX-License-Identifier: GPL-3.0-or-later
use bytes::Bytes;
use image::RgbImage;

#[cfg(feature = "mozjpeg")]
use mozjpeg::{ColorSpace, Compress};

#[cfg(not(feature = "mozjpeg"))]
use bytes::{BufMut, BytesMut};
#[cfg(not(feature = "mozjpeg"))]
use image::{codecs::jpeg::JpegEncoder, ColorType};

use crate::error::RenderError;

#[cfg(feature = "mozjpeg")]
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Bytes, RenderError> {
    // A fresh encoder each time keeps this usable from any thread.
    let mut jpeg_encoder = Compress::new(ColorSpace::JCS_RGB);
    jpeg_encoder.set_fastest_defaults();
    jpeg_encoder.set_quality(quality as f32);
    jpeg_encoder.set_mem_dest();
    jpeg_encoder.set_size(image.width() as usize, image.height() as usize);
    jpeg_encoder.start_compress();
    if !jpeg_encoder.write_scanlines(image.as_raw()) {
        return Err(RenderError::Encode(anyhow::anyhow!(
            "mozjpeg did not accept every scanline"
        )));
    }
    jpeg_encoder.finish_compress();
    jpeg_encoder
        .data_to_vec()
        .map(Bytes::from)
        .map_err(|_| RenderError::Encode(anyhow::anyhow!("mozjpeg produced no data")))
}

#[cfg(not(feature = "mozjpeg"))]
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Bytes, RenderError> {
    let mut jpeg_buf = BytesMut::new().writer();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg_buf, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::Rgb8,
        )
        .map_err(|err| RenderError::Encode(err.into()))?;
    Ok(jpeg_buf.into_inner().freeze())
}
