//! Camera device acquisition and frame pulls
//!
//! The device handle is an exclusive resource: it is owned by exactly one
//! capture loop and the stream is stopped when the handle drops, on every
//! exit path.

use crate::errors::TimelapseError;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

pub struct CaptureDevice {
    camera: Camera,
    index: u32,
}

impl CaptureDevice {
    /// Open the first camera that responds, trying each index in order.
    pub fn open(indices: &[u32]) -> Result<Self, TimelapseError> {
        for &index in indices {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

            let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
                Ok(camera) => camera,
                Err(e) => {
                    log::warn!("Camera index {} failed to initialize: {}", index, e);
                    continue;
                }
            };

            match camera.open_stream() {
                Ok(()) => {
                    log::info!("Opened camera at index {}", index);
                    return Ok(Self { camera, index });
                }
                Err(e) => log::warn!("Camera index {} failed to start stream: {}", index, e),
            }
        }

        Err(TimelapseError::DeviceUnavailable(format!(
            "no camera could be opened (tried indices {:?})",
            indices
        )))
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Pull one frame and decode it to RGB.
    pub fn capture_frame(&mut self) -> Result<RgbImage, TimelapseError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| TimelapseError::CaptureError(format!("Failed to capture frame: {}", e)))?;

        buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| TimelapseError::CaptureError(format!("Failed to decode frame: {}", e)))
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", e);
        }
    }
}
