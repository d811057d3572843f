//! Video assembly via ffmpeg
//!
//! Builds a concat-demuxer playlist from a session's frames and invokes
//! the external encoder as a blocking child process. The playlist is a
//! transient artifact and is removed whether or not the encode succeeds;
//! deleting the consumed frames after success is the caller's job, so a
//! failed render always leaves the frames available for a retry.

use crate::config::TimelapseConfig;
use crate::errors::TimelapseError;
use crate::store::FrameStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct RenderPipeline {
    store: FrameStore,
    video_dir: PathBuf,
    fps: u32,
    crf: u32,
    preset: String,
    ffmpeg_path: String,
    pad_to: Option<(u32, u32)>,
}

impl RenderPipeline {
    pub fn new(config: &TimelapseConfig, store: FrameStore) -> Self {
        let pad_to = config
            .output
            .portrait
            .then_some((config.output.width, config.output.height));
        Self {
            store,
            video_dir: PathBuf::from(&config.storage.video_dir),
            fps: config.render.fps,
            crf: config.render.crf,
            preset: config.render.preset.clone(),
            ffmpeg_path: config.render.ffmpeg_path.clone(),
            pad_to,
        }
    }

    /// Assemble a session's frames into a video, in sequence order.
    ///
    /// When `expected_frames` is nonzero the frame list is capped at that
    /// many entries, so stray files left behind by an earlier crash of the
    /// same session id cannot leak into the output.
    pub fn render(
        &self,
        session_id: u64,
        expected_frames: usize,
    ) -> Result<PathBuf, TimelapseError> {
        let mut frames = self.store.list_frames(session_id);
        if expected_frames > 0 && frames.len() > expected_frames {
            log::warn!(
                "Session {} has {} frames on disk but {} were expected, ignoring the extras",
                session_id,
                frames.len(),
                expected_frames
            );
            frames.truncate(expected_frames);
        }

        if frames.is_empty() {
            return Err(TimelapseError::NoFramesFound(session_id));
        }

        // The concat demuxer needs absolute paths.
        let mut absolute = Vec::with_capacity(frames.len());
        for frame in &frames {
            let path = frame.canonicalize().map_err(|e| {
                TimelapseError::PersistenceError(format!(
                    "Failed to resolve frame path {}: {}",
                    frame.display(),
                    e
                ))
            })?;
            absolute.push(path);
        }

        let playlist = self.store.playlist_path(session_id);
        fs::write(&playlist, self.playlist_contents(&absolute)).map_err(|e| {
            TimelapseError::PersistenceError(format!("Failed to write playlist: {}", e))
        })?;
        let _playlist = PlaylistGuard::new(playlist.clone());

        let output = self.output_path(session_id);
        log::info!(
            "Rendering session {} ({} frames) to {}",
            session_id,
            frames.len(),
            output.display()
        );

        let result = Command::new(&self.ffmpeg_path)
            .args(self.encoder_args(&playlist, &output))
            .output()
            .map_err(|e| {
                TimelapseError::EncodeError(format!(
                    "Failed to run {}: {}",
                    self.ffmpeg_path, e
                ))
            })?;

        if !result.status.success() {
            return Err(TimelapseError::EncodeError(
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ));
        }

        Ok(output)
    }

    /// Concat-demuxer playlist: a `file`/`duration` line pair per frame,
    /// each frame shown for 1/FPS seconds.
    pub fn playlist_contents(&self, frames: &[PathBuf]) -> String {
        let duration = 1.0 / f64::from(self.fps);
        let mut playlist = String::new();
        for frame in frames {
            playlist.push_str(&format!(
                "file '{}'\nduration {}\n",
                frame.display(),
                duration
            ));
        }
        playlist
    }

    pub fn output_path(&self, session_id: u64) -> PathBuf {
        self.video_dir.join(format!("out{}.mp4", session_id))
    }

    fn encoder_args(&self, playlist: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            playlist.to_string_lossy().into_owned(),
            "-r".to_string(),
            self.fps.to_string(),
        ];

        if let Some((w, h)) = self.pad_to {
            args.push("-vf".to_string());
            args.push(format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1"
            ));
        }

        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Removes the playlist file when the render attempt ends, success or not.
struct PlaylistGuard {
    path: PathBuf,
}

impl PlaylistGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for PlaylistGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Failed to remove playlist {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(config: &TimelapseConfig) -> RenderPipeline {
        RenderPipeline::new(config, FrameStore::new(&config.storage))
    }

    #[test]
    fn test_encoder_args_landscape() {
        let config = TimelapseConfig::default();
        let p = pipeline(&config);
        let args = p.encoder_args(Path::new("/tmp/list.txt"), Path::new("/tmp/out1.mp4"));

        assert_eq!(args[0..2], ["-f", "concat"]);
        assert!(args.contains(&"-safe".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(&"-y".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out1.mp4");
    }

    #[test]
    fn test_encoder_args_portrait_filter() {
        let mut config = TimelapseConfig::default();
        config.output.portrait = true;
        let p = pipeline(&config);
        let args = p.encoder_args(Path::new("list.txt"), Path::new("out.mp4"));

        let vf = args.iter().position(|a| a == "-vf").expect("-vf present");
        let filter = &args[vf + 1];
        assert!(filter.contains("scale=720:1280"));
        assert!(filter.contains("pad=720:1280"));
        assert!(filter.contains("setsar=1"));
    }

    #[test]
    fn test_playlist_duration_from_fps() {
        let config = TimelapseConfig::default();
        let p = pipeline(&config);
        let contents =
            p.playlist_contents(&[PathBuf::from("/f/a.jpg"), PathBuf::from("/f/b.jpg")]);
        assert_eq!(
            contents,
            "file '/f/a.jpg'\nduration 0.04\nfile '/f/b.jpg'\nduration 0.04\n"
        );
    }
}
