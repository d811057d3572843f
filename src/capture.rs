//! Fixed-cadence capture loop
//!
//! Drives the camera for one session: pulls a frame every interval until
//! the configured duration elapses or cancellation is requested, handing
//! each frame a monotonically increasing sequence number. Sequence numbers
//! start at 0 and are never reused within a session.

use crate::camera::CaptureDevice;
use crate::config::CaptureConfig;
use crate::errors::TimelapseError;
use crate::store::FrameStore;
use crate::transform::PortraitTransform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which waits re-check the cancellation flag.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Pause after a failed frame pull before trying again.
const PULL_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct CaptureLoop {
    store: FrameStore,
    interval: Duration,
    duration: Duration,
    device_indices: Vec<u32>,
    transform: Option<PortraitTransform>,
    cancel: Arc<AtomicBool>,
}

impl CaptureLoop {
    pub fn new(
        config: &CaptureConfig,
        store: FrameStore,
        transform: Option<PortraitTransform>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            interval: Duration::from_secs(config.interval_secs),
            duration: Duration::from_secs(config.duration_secs),
            device_indices: config.device_indices.clone(),
            transform,
            cancel,
        }
    }

    /// Capture frames for one session and return how many were written.
    ///
    /// The device handle is released when this returns, on the success,
    /// error, and cancellation paths alike.
    pub fn run(&self, session_id: u64) -> Result<u32, TimelapseError> {
        let mut device = CaptureDevice::open(&self.device_indices)?;
        log::info!(
            "Session {}: capturing every {:?} for up to {:?} on device {}",
            session_id,
            self.interval,
            self.duration,
            device.index()
        );

        let started = Instant::now();
        let mut frame_count: u32 = 0;

        while !self.cancelled() && started.elapsed() < self.duration {
            let frame = match device.capture_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    // Transient device hiccup: retry without consuming a
                    // cadence slot or a sequence number.
                    log::warn!("Frame pull failed, retrying: {}", e);
                    self.wait(PULL_RETRY_DELAY);
                    continue;
                }
            };

            let frame = match &self.transform {
                Some(transform) => transform.apply(&frame),
                None => frame,
            };

            // A write failure here has already exhausted the store's local
            // retries; a hole in the sequence would corrupt playback order,
            // so the whole loop aborts.
            self.store.write_frame(session_id, frame_count, &frame)?;
            frame_count += 1;
            log::debug!("Session {}: frame {} written", session_id, frame_count);

            self.wait(self.interval);
        }

        log::info!(
            "Session {}: capture finished with {} frames",
            session_id,
            frame_count
        );
        Ok(frame_count)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Sleep in short ticks so cancellation is honored within ~100ms
    /// rather than after a full cadence interval.
    fn wait(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(CANCEL_POLL));
        }
    }
}
