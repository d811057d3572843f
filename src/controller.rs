//! Session lifecycle orchestration
//!
//! Owns the run modes: continuous capture (capture a session, render it,
//! delete its frames, repeat) and render-only (rebuild videos from frames
//! already on disk, leaving the frames in place). Cancellation arrives via
//! a shared flag set by the signal handler; all finalization work runs on
//! this thread, never inside the handler.

use crate::capture::CaptureLoop;
use crate::config::TimelapseConfig;
use crate::errors::TimelapseError;
use crate::render::RenderPipeline;
use crate::session::SessionLedger;
use crate::store::FrameStore;
use crate::transform::PortraitTransform;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Pause after a failed session before starting a fresh one.
const SESSION_RETRY_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Capture,
    RenderOnly,
}

pub struct TimelapseController {
    config: TimelapseConfig,
    store: FrameStore,
    ledger: SessionLedger,
    renderer: RenderPipeline,
    capture: CaptureLoop,
    cancel: Arc<AtomicBool>,
}

impl TimelapseController {
    pub fn new(config: TimelapseConfig, cancel: Arc<AtomicBool>) -> Self {
        let store = FrameStore::new(&config.storage);
        let ledger = SessionLedger::new(store.clone());
        let renderer = RenderPipeline::new(&config, store.clone());

        let transform = config
            .output
            .portrait
            .then(|| PortraitTransform::new(config.output.width, config.output.height));
        let capture = CaptureLoop::new(&config.capture, store.clone(), transform, cancel.clone());

        Self {
            config,
            store,
            ledger,
            renderer,
            capture,
            cancel,
        }
    }

    pub fn run(&self, mode: RunMode) -> Result<(), TimelapseError> {
        self.ensure_dirs()?;
        match mode {
            RunMode::Capture => self.run_capture(),
            RunMode::RenderOnly => {
                self.run_render_only();
                Ok(())
            }
        }
    }

    /// Continuous capture: one session after another until cancelled.
    ///
    /// A session that fails is logged and followed by a short pause before
    /// a fresh session id is started. The exception is a camera that never
    /// opens on the very first session, which is a startup failure and
    /// propagates out.
    fn run_capture(&self) -> Result<(), TimelapseError> {
        let mut first_session = true;

        while !self.cancelled() {
            let session_id = self.ledger.next_session_id();
            log::info!("Starting session {}", session_id);

            match self.capture.run(session_id) {
                Ok(0) => {
                    log::info!("Session {} captured no frames, nothing to render", session_id)
                }
                Ok(frame_count) => self.process_session(session_id, frame_count),
                Err(e) => {
                    if first_session && matches!(e, TimelapseError::DeviceUnavailable(_)) {
                        return Err(e);
                    }
                    log::error!("Session {} failed: {}", session_id, e);
                    self.pause_before_retry();
                }
            }

            first_session = false;
        }

        log::info!("Shutdown requested, capture loop stopped");
        Ok(())
    }

    /// Render a finished (or interrupted) session and, only if the render
    /// succeeded, delete the consumed frames. A failed render keeps the
    /// frames so a later render-only pass can retry.
    pub fn process_session(&self, session_id: u64, frame_count: u32) {
        match self.renderer.render(session_id, frame_count as usize) {
            Ok(path) => {
                log::info!("Session {} rendered to {}", session_id, path.display());
                self.store.delete_frames(session_id);
                log::info!("Session {} frames deleted", session_id);
            }
            Err(e) => log::error!("Failed to render session {}: {}", session_id, e),
        }
    }

    /// Rebuild videos for every session present on disk. Frames are left
    /// untouched so the pass can be repeated; each session's failure is
    /// isolated from the rest of the batch.
    fn run_render_only(&self) {
        let sessions = self.ledger.existing_sessions();
        if sessions.is_empty() {
            log::info!("No sessions found to render");
            return;
        }

        for session_id in sessions {
            let frame_count = self.store.list_frames(session_id).len();
            if frame_count == 0 {
                continue;
            }
            log::info!("Rendering session {} ({} frames)", session_id, frame_count);
            match self.renderer.render(session_id, frame_count) {
                Ok(path) => log::info!("Session {} rendered to {}", session_id, path.display()),
                Err(e) => log::error!("Failed to render session {}: {}", session_id, e),
            }
        }
    }

    fn ensure_dirs(&self) -> Result<(), TimelapseError> {
        for dir in [&self.config.storage.frames_dir, &self.config.storage.video_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                TimelapseError::PersistenceError(format!(
                    "Failed to create directory {}: {}",
                    dir, e
                ))
            })?;
        }
        Ok(())
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn pause_before_retry(&self) {
        let deadline = Instant::now() + SESSION_RETRY_PAUSE;
        while !self.cancelled() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(100));
        }
    }
}
