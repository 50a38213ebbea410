use image::RgbaImage;

use crate::subtitles::domain::color_map::ColorMap;

/// Rasterises one word group into a transparent `width x height` band.
pub trait SubtitleRenderer: Send + Sync {
    fn render(&self, text: &str, colors: &ColorMap, width: u32, height: u32) -> RgbaImage;
}
