//! Filesystem-backed frame storage
//!
//! Frames are the only durable record of a capture session: every query
//! about session identity or progress is answered by scanning this
//! directory. Filename formatting and parsing live here and nowhere else.
//!
//! Frame files are named `session_<id>_frame_<seq>_<timestamp>.jpg` with
//! the sequence number zero-padded to four digits.

use crate::config::StorageConfig;
use crate::errors::TimelapseError;
use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FrameStore {
    frames_dir: PathBuf,
    jpeg_quality: u8,
    write_attempts: u32,
    write_retry_delay: Duration,
}

impl FrameStore {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            frames_dir: PathBuf::from(&storage.frames_dir),
            jpeg_quality: storage.jpeg_quality,
            write_attempts: storage.write_attempts.max(1),
            write_retry_delay: Duration::from_millis(storage.write_retry_delay_ms),
        }
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    /// Persist one frame, retrying on transient encode or I/O failure.
    ///
    /// The file is checked for existence after each attempt so a silently
    /// failed encode does not count as success.
    pub fn write_frame(
        &self,
        session_id: u64,
        sequence: u32,
        image: &RgbImage,
    ) -> Result<PathBuf, TimelapseError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = self
            .frames_dir
            .join(format_frame_name(session_id, sequence, &timestamp));

        let mut last_error = String::new();
        for attempt in 1..=self.write_attempts {
            match self.encode_jpeg(&path, image) {
                Ok(()) if path.exists() => return Ok(path),
                Ok(()) => last_error = format!("{} missing after write", path.display()),
                Err(e) => last_error = e.to_string(),
            }

            if attempt < self.write_attempts {
                log::warn!(
                    "Write attempt {}/{} for frame {} of session {} failed: {}",
                    attempt,
                    self.write_attempts,
                    sequence,
                    session_id,
                    last_error
                );
                thread::sleep(self.write_retry_delay);
            }
        }

        Err(TimelapseError::PersistenceError(format!(
            "Failed to save frame {} of session {} after {} attempts: {}",
            sequence, session_id, self.write_attempts, last_error
        )))
    }

    fn encode_jpeg(&self, path: &Path, image: &RgbImage) -> Result<(), image::ImageError> {
        let mut file = File::create(path)?;
        let encoder = JpegEncoder::new_with_quality(&mut file, self.jpeg_quality);
        image.write_with_encoder(encoder)
    }

    /// All frame files for a session, ordered by the sequence number
    /// embedded in the filename.
    ///
    /// Directory enumeration order is unspecified and frame timestamps
    /// only have second resolution, so neither is used for ordering.
    pub fn list_frames(&self, session_id: u64) -> Vec<PathBuf> {
        let mut frames: Vec<(u32, PathBuf)> = self
            .scan()
            .into_iter()
            .filter(|(session, _, _)| *session == session_id)
            .map(|(_, sequence, path)| (sequence, path))
            .collect();
        frames.sort_by_key(|(sequence, _)| *sequence);
        frames.into_iter().map(|(_, path)| path).collect()
    }

    /// Distinct session ids present in the store, ascending.
    pub fn list_sessions(&self) -> Vec<u64> {
        let sessions: BTreeSet<u64> = self
            .scan()
            .into_iter()
            .map(|(session, _, _)| session)
            .collect();
        sessions.into_iter().collect()
    }

    /// Best-effort removal of a session's frames. Individual failures are
    /// logged and skipped; a later render pass can retry the cleanup.
    pub fn delete_frames(&self, session_id: u64) {
        for path in self.list_frames(session_id) {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to delete frame {}: {}", path.display(), e);
            }
        }
    }

    /// Location of the transient encoder playlist for a session.
    pub fn playlist_path(&self, session_id: u64) -> PathBuf {
        self.frames_dir.join(format!("ffmpeg_list_{}.txt", session_id))
    }

    /// Scan the frames directory, yielding (session, sequence, path) for
    /// every parseable frame file. Unparseable names are ignored.
    fn scan(&self) -> Vec<(u64, u32, PathBuf)> {
        let entries = match fs::read_dir(&self.frames_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut frames = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((session, sequence)) = parse_frame_name(name) {
                frames.push((session, sequence, entry.path()));
            }
        }
        frames
    }
}

fn format_frame_name(session_id: u64, sequence: u32, timestamp: &str) -> String {
    format!(
        "session_{}_frame_{:04}_{}.jpg",
        session_id, sequence, timestamp
    )
}

/// Parse `session_<id>_frame_<seq>_<timestamp>.jpg` into (id, seq).
fn parse_frame_name(name: &str) -> Option<(u64, u32)> {
    let stem = name.strip_suffix(".jpg")?;
    let mut parts = stem.split('_');
    if parts.next()? != "session" {
        return None;
    }
    let session = parts.next()?.parse::<u64>().ok()?;
    if parts.next()? != "frame" {
        return None;
    }
    let sequence = parts.next()?.parse::<u32>().ok()?;
    // Remainder is the capture timestamp; presence is enough.
    parts.next()?;
    Some((session, sequence))
}
