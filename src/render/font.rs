// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use tracing::{debug, warn};

use super::settings::RenderSettings;

/// Places DejaVu Sans is commonly installed, checked in order when no font is configured.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/usr/local/share/fonts/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

pub(crate) trait FontRenderer: fmt::Debug {
    /// Rasterize a single line of text into an opacity mask. The mask is exactly as large as the
    /// text.
    fn render_text(&self, text: &str) -> Arc<GrayImage>;
}

fn candidate_paths(settings: &RenderSettings) -> Vec<PathBuf> {
    settings
        .font_path
        .iter()
        .cloned()
        .chain(SYSTEM_FONT_PATHS.iter().map(PathBuf::from))
        .collect()
}

#[cfg(feature = "render_fontdue")]
fn load_from(path: &Path, size: f32) -> anyhow::Result<Box<dyn FontRenderer + Send + Sync>> {
    let bytes = std::fs::read(path)?;
    Ok(Box::new(super::cheese::FontdueRenderer::new(bytes, size)?))
}

#[cfg(not(feature = "render_fontdue"))]
fn load_from(_path: &Path, _size: f32) -> anyhow::Result<Box<dyn FontRenderer + Send + Sync>> {
    Err(anyhow::anyhow!("font rendering was not enabled for this build"))
}

/// Create a font renderer from the configured font, or the first system font that loads.
///
/// Returns `None` if no font could be loaded, in which case labels are not drawn.
pub(crate) fn load_renderer(settings: &RenderSettings) -> Option<Box<dyn FontRenderer + Send + Sync>> {
    for path in candidate_paths(settings) {
        let is_configured = settings.font_path.as_ref() == Some(&path);
        match load_from(&path, settings.font_size) {
            Ok(renderer) => {
                debug!(?path, "Loaded label font");
                return Some(renderer);
            }
            Err(err) if is_configured => {
                warn!(?path, error = %err, "Unable to load configured font");
            }
            Err(err) => {
                debug!(?path, error = %err, "Skipping font");
            }
        }
    }
    warn!("No usable font found, temperature labels will not be drawn");
    None
}
