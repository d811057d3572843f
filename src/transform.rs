//! Portrait frame transform
//!
//! Landscape webcam frames are rotated upright, center-cropped to the
//! target aspect ratio, and scaled to the exact output canvas. Capture
//! runs the identity path when portrait output is disabled, so a single
//! capture loop serves both orientations.

use image::imageops::{self, FilterType};
use image::RgbImage;

#[derive(Debug, Clone, Copy)]
pub struct PortraitTransform {
    width: u32,
    height: u32,
}

impl PortraitTransform {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rotate 90 degrees clockwise, crop centered to the target aspect
    /// ratio, then resize to exactly the configured dimensions.
    pub fn apply(&self, frame: &RgbImage) -> RgbImage {
        let rotated = imageops::rotate90(frame);
        let (w, h) = rotated.dimensions();

        let target_ratio = f64::from(self.height) / f64::from(self.width);
        let current_ratio = f64::from(h) / f64::from(w);

        let cropped = if current_ratio > target_ratio {
            let new_h = ((f64::from(w) * target_ratio) as u32).max(1);
            let offset = (h - new_h) / 2;
            imageops::crop_imm(&rotated, 0, offset, w, new_h).to_image()
        } else if current_ratio < target_ratio {
            let new_w = ((f64::from(h) / target_ratio) as u32).max(1);
            let offset = (w - new_w) / 2;
            imageops::crop_imm(&rotated, offset, 0, new_w, h).to_image()
        } else {
            rotated
        };

        imageops::resize(&cropped, self.width, self.height, FilterType::Triangle)
    }
}
