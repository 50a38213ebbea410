use image::imageops::{self, FilterType};
use image::RgbImage;

/// Center-crops `photo` to the `width / height` aspect ratio, then scales it
/// to exactly `width x height`. Never letterboxes.
pub fn fit_to_frame(photo: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (crop_x, crop_y, crop_w, crop_h) =
        centered_crop(photo.width(), photo.height(), width, height);
    let cropped = imageops::crop_imm(photo, crop_x, crop_y, crop_w, crop_h).to_image();
    if cropped.dimensions() == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Lanczos3)
}

/// Largest centered `(x, y, w, h)` window of the source with the target aspect.
///
/// A source wider than the target loses columns on both sides; otherwise it
/// loses rows top and bottom.
pub fn centered_crop(
    src_w: u32,
    src_h: u32,
    target_w: u32,
    target_h: u32,
) -> (u32, u32, u32, u32) {
    let target_ratio = target_w as f64 / target_h as f64;
    let src_ratio = src_w as f64 / src_h as f64;

    if src_ratio > target_ratio {
        let new_w = ((src_h as f64 * target_ratio) as u32).clamp(1, src_w);
        ((src_w - new_w) / 2, 0, new_w, src_h)
    } else {
        let new_h = ((src_w as f64 / target_ratio) as u32).clamp(1, src_h);
        (0, (src_h - new_h) / 2, src_w, new_h)
    }
}
