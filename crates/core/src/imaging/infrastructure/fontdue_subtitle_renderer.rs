use std::fs;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::RgbaImage;
use thiserror::Error;

use crate::imaging::domain::subtitle_renderer::SubtitleRenderer;
use crate::subtitles::domain::color_map::ColorMap;

const OUTLINE_COLOR: [u8; 3] = [0, 0, 0];

#[derive(Error, Debug)]
pub enum FontLoadError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Coverage mask of one word's ink box. `top` is relative to the baseline
/// (y grows downward, so it is usually negative).
struct WordMask {
    top: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

impl WordMask {
    fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }
}

/// Draws word groups as outlined, color-coded text with `fontdue`.
///
/// All words share one baseline; the union of their ink is centered in the
/// band. Each word is stamped in black at every offset within the outline
/// radius before its fill is drawn.
pub struct FontdueSubtitleRenderer {
    font: Font,
    font_size: f32,
    outline_thickness: u32,
    word_gap: u32,
    outline_offsets: Vec<(i32, i32)>,
}

impl FontdueSubtitleRenderer {
    pub fn new(font: Font, font_size: f32, outline_thickness: u32, word_gap: u32) -> Self {
        let r = outline_thickness as i32;
        let outline_offsets = (-r..=r)
            .flat_map(|dx| (-r..=r).map(move |dy| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();
        Self {
            font,
            font_size,
            outline_thickness,
            word_gap,
            outline_offsets,
        }
    }

    pub fn from_file(
        path: &Path,
        font_size: f32,
        outline_thickness: u32,
        word_gap: u32,
    ) -> Result<Self, FontLoadError> {
        let bytes = fs::read(path).map_err(|e| FontLoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            FontLoadError::Parse {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            }
        })?;
        log::debug!("Loaded font {} at {font_size}px", path.display());
        Ok(Self::new(font, font_size, outline_thickness, word_gap))
    }

    pub fn outline_thickness(&self) -> u32 {
        self.outline_thickness
    }

    fn rasterize_word(&self, word: &str) -> WordMask {
        struct Placed {
            x: i32,
            y: i32,
            width: usize,
            height: usize,
            bitmap: Vec<u8>,
        }

        let mut placed = Vec::new();
        let mut pen_x = 0.0f32;
        let mut previous: Option<char> = None;

        for ch in word.chars() {
            if let Some(prev) = previous {
                pen_x += self
                    .font
                    .horizontal_kern(prev, ch, self.font_size)
                    .unwrap_or(0.0);
            }
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            if metrics.width > 0 && metrics.height > 0 {
                placed.push(Placed {
                    x: pen_x.round() as i32 + metrics.xmin,
                    y: -(metrics.ymin + metrics.height as i32),
                    width: metrics.width,
                    height: metrics.height,
                    bitmap,
                });
            }
            pen_x += metrics.advance_width;
            previous = Some(ch);
        }

        if placed.is_empty() {
            return WordMask {
                top: 0,
                width: 0,
                height: 0,
                coverage: Vec::new(),
            };
        }

        let left = placed.iter().map(|g| g.x).min().unwrap_or(0);
        let top = placed.iter().map(|g| g.y).min().unwrap_or(0);
        let right = placed.iter().map(|g| g.x + g.width as i32).max().unwrap_or(0);
        let bottom = placed.iter().map(|g| g.y + g.height as i32).max().unwrap_or(0);
        let width = (right - left) as usize;
        let height = (bottom - top) as usize;

        let mut coverage = vec![0u8; width * height];
        for glyph in &placed {
            let ox = (glyph.x - left) as usize;
            let oy = (glyph.y - top) as usize;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    let src = glyph.bitmap[row * glyph.width + col];
                    let dst = &mut coverage[(oy + row) * width + ox + col];
                    *dst = (*dst).max(src);
                }
            }
        }

        WordMask {
            top,
            width,
            height,
            coverage,
        }
    }

    fn stamp_outline(&self, canvas: &mut RgbaImage, mask: &WordMask, x: i32, y: i32) {
        let pad = self.outline_thickness as i32;
        let dilated_w = mask.width + 2 * pad as usize;
        let dilated_h = mask.height + 2 * pad as usize;
        let mut dilated = vec![0u8; dilated_w * dilated_h];

        for row in 0..mask.height {
            for col in 0..mask.width {
                let a = mask.coverage[row * mask.width + col];
                if a == 0 {
                    continue;
                }
                for &(dx, dy) in &self.outline_offsets {
                    let px = (col as i32 + pad + dx) as usize;
                    let py = (row as i32 + pad + dy) as usize;
                    let dst = &mut dilated[py * dilated_w + px];
                    *dst = (*dst).max(a);
                }
            }
        }

        blend_coverage(
            canvas,
            &dilated,
            dilated_w,
            dilated_h,
            x - pad,
            y - pad,
            OUTLINE_COLOR,
        );
    }
}

impl SubtitleRenderer for FontdueSubtitleRenderer {
    fn render(&self, text: &str, colors: &ColorMap, width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(width, height);

        let words: Vec<(&str, WordMask)> = text
            .split_whitespace()
            .map(|word| (word, self.rasterize_word(word)))
            .collect();
        if words.is_empty() {
            return canvas;
        }

        let ink_top = words.iter().map(|(_, m)| m.top).min().unwrap_or(0);
        let ink_bottom = words.iter().map(|(_, m)| m.bottom()).max().unwrap_or(0);
        let baseline = (height as i32 - (ink_bottom - ink_top)) / 2 - ink_top;

        let total_width: i32 = words.iter().map(|(_, m)| m.width as i32).sum::<i32>()
            + (words.len() as i32 - 1) * self.word_gap as i32;
        let mut cursor = (width as i32 - total_width) / 2;

        for (word, mask) in &words {
            let x = cursor;
            let y = baseline + mask.top;
            self.stamp_outline(&mut canvas, mask, x, y);
            blend_coverage(
                &mut canvas,
                &mask.coverage,
                mask.width,
                mask.height,
                x,
                y,
                colors.resolve(word).rgb(),
            );
            cursor += mask.width as i32 + self.word_gap as i32;
        }

        canvas
    }
}

/// Source-over blend of a solid color through a coverage mask onto an RGBA canvas.
fn blend_coverage(
    canvas: &mut RgbaImage,
    coverage: &[u8],
    mask_w: usize,
    mask_h: usize,
    x: i32,
    y: i32,
    color: [u8; 3],
) {
    let canvas_w = canvas.width() as i32;
    let canvas_h = canvas.height() as i32;

    for row in 0..mask_h {
        let py = y + row as i32;
        if py < 0 || py >= canvas_h {
            continue;
        }
        for col in 0..mask_w {
            let px = x + col as i32;
            if px < 0 || px >= canvas_w {
                continue;
            }
            let src_a = coverage[row * mask_w + col] as f32 / 255.0;
            if src_a == 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            let dst_a = dst[3] as f32 / 255.0;
            let out_a = src_a + dst_a * (1.0 - src_a);
            for c in 0..3 {
                let blended =
                    (color[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
                dst[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round() as u8;
        }
    }
}
