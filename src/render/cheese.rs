// SPDX-License-Identifier: GPL-3.0-or-later
//! Label rasterizing with [fontdue].
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::GrayImage;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use super::font::FontRenderer;

// Labels are mostly the same few temperatures from frame to frame.
const LABEL_CACHE_SIZE: usize = 64;

pub(crate) struct FontdueRenderer {
    font: Font,
    size: f32,
    layout: Mutex<Layout>,
    cache: Mutex<LruCache<String, Arc<GrayImage>>>,
}

impl FontdueRenderer {
    pub(crate) fn new(font_data: Vec<u8>, size: f32) -> anyhow::Result<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|e| anyhow!(e))?;
        Ok(Self {
            font,
            size,
            layout: Mutex::new(Layout::new(CoordinateSystem::PositiveYDown)),
            cache: Mutex::new(LruCache::new(LABEL_CACHE_SIZE)),
        })
    }

    fn rasterize(&self, text: &str) -> GrayImage {
        let mut layout = self.layout.lock();
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, self.size, 0));
        let glyphs: Vec<_> = layout
            .glyphs()
            .iter()
            .map(|glyph| {
                let (metrics, bitmap) = self.font.rasterize_config(glyph.key);
                (glyph.x.max(0.0) as u32, glyph.y.max(0.0) as u32, metrics, bitmap)
            })
            .collect();
        let width = glyphs
            .iter()
            .map(|(x, _, metrics, _)| x + metrics.width as u32)
            .max()
            .unwrap_or(0);
        let height = glyphs
            .iter()
            .map(|(_, y, metrics, _)| y + metrics.height as u32)
            .max()
            .unwrap_or(0);
        // Transfer the rasterized glyphs onto an image mask. The mask is just the opacity for
        // each pixel.
        let mut mask = GrayImage::new(width, height);
        for (x, y, metrics, bitmap) in glyphs {
            if metrics.width == 0 {
                continue;
            }
            for (index, coverage) in bitmap.into_iter().enumerate() {
                let column = x + (index % metrics.width) as u32;
                let row = y + (index / metrics.width) as u32;
                let pixel = mask.get_pixel_mut(column, row);
                pixel.0[0] = pixel.0[0].max(coverage);
            }
        }
        mask
    }
}

impl fmt::Debug for FontdueRenderer {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // fontdue::layout::Layout doesn't implement Debug
        fmt.debug_struct("FontdueRenderer")
            .field("font", &self.font)
            .field("size", &self.size)
            .field("layout", &"Mutex<Layout { opaque }>")
            .field("cache", &self.cache.lock().len())
            .finish()
    }
}

impl FontRenderer for FontdueRenderer {
    fn render_text(&self, text: &str) -> Arc<GrayImage> {
        let key = text.to_string();
        let mut cache = self.cache.lock();
        if let Some(mask) = cache.get(&key) {
            return Arc::clone(mask);
        }
        trace!(text, "label cache miss");
        let mask = Arc::new(self.rasterize(text));
        cache.put(key, Arc::clone(&mask));
        mask
    }
}
