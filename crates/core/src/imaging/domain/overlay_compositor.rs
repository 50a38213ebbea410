use image::{RgbImage, RgbaImage};

use crate::shared::frame::Frame;

/// Produces a frame from `background` with `overlay` alpha-blended at row
/// `top`, horizontally centered, its alpha scaled by `opacity`.
///
/// Overlay pixels falling outside the background are clipped.
pub fn compose_frame(
    background: &RgbImage,
    overlay: Option<(&RgbaImage, u32)>,
    opacity: f32,
    index: usize,
) -> Frame {
    let mut frame = Frame::from_rgb_image(background.clone(), index);
    if let Some((overlay, top)) = overlay {
        blend_overlay(&mut frame, overlay, top, opacity);
    }
    frame
}

pub fn blend_overlay(frame: &mut Frame, overlay: &RgbaImage, top: u32, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 {
        return;
    }

    let frame_w = frame.width() as i64;
    let frame_h = frame.height() as i64;
    let left = (frame_w - overlay.width() as i64) / 2;
    let data = frame.data_mut();

    for (ox, oy, pixel) in overlay.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let x = left + ox as i64;
        let y = top as i64 + oy as i64;
        if x < 0 || y < 0 || x >= frame_w || y >= frame_h {
            continue;
        }
        let idx = ((y * frame_w + x) * 3) as usize;
        for c in 0..3 {
            let dst = data[idx + c] as f32;
            let src = pixel[c] as f32;
            data[idx + c] = (src * alpha + dst * (1.0 - alpha)).round() as u8;
        }
    }
}
