#![cfg(unix)]

use crablapse::config::TimelapseConfig;
use crablapse::controller::{RunMode, TimelapseController};
use crablapse::store::FrameStore;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn config_in(dir: &Path) -> TimelapseConfig {
    let mut config = TimelapseConfig::default();
    config.storage.frames_dir = dir.join("frames").to_string_lossy().into_owned();
    config.storage.video_dir = dir.join("videos").to_string_lossy().into_owned();
    fs::create_dir_all(&config.storage.frames_dir).unwrap();
    fs::create_dir_all(&config.storage.video_dir).unwrap();
    config
}

fn touch_frame(config: &TimelapseConfig, session: u64, sequence: u32) {
    let name = format!("session_{}_frame_{:04}_20260101_000000.jpg", session, sequence);
    fs::write(Path::new(&config.storage.frames_dir).join(name), b"").unwrap();
}

fn stub_encoder(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake_ffmpeg.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn controller(config: TimelapseConfig) -> TimelapseController {
    TimelapseController::new(config, Arc::new(AtomicBool::new(false)))
}

#[test]
fn test_process_session_deletes_frames_after_successful_render() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.render.ffmpeg_path = stub_encoder(dir.path(), "exit 0");

    let store = FrameStore::new(&config.storage);
    for sequence in 0..3 {
        touch_frame(&config, 1, sequence);
    }

    controller(config).process_session(1, 3);

    assert!(store.list_frames(1).is_empty());
    assert!(!store.playlist_path(1).exists());
}

#[test]
fn test_process_session_keeps_frames_after_failed_render() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.render.ffmpeg_path = stub_encoder(dir.path(), "exit 1");

    let store = FrameStore::new(&config.storage);
    for sequence in 0..3 {
        touch_frame(&config, 1, sequence);
    }

    controller(config).process_session(1, 3);

    // Frames survive for a later render-only pass; the playlist does not.
    assert_eq!(store.list_frames(1).len(), 3);
    assert!(!store.playlist_path(1).exists());
}

#[test]
fn test_render_only_on_empty_store_invokes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());

    let marker = dir.path().join("invoked");
    config.render.ffmpeg_path =
        stub_encoder(dir.path(), &format!("echo run >> {}", marker.display()));

    controller(config).run(RunMode::RenderOnly).unwrap();
    assert!(!marker.exists());
}

#[test]
fn test_render_only_renders_each_session_and_keeps_frames() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.render.ffmpeg_path = stub_encoder(dir.path(), "exit 0");

    let store = FrameStore::new(&config.storage);
    touch_frame(&config, 1, 0);
    touch_frame(&config, 1, 1);
    touch_frame(&config, 4, 0);

    controller(config).run(RunMode::RenderOnly).unwrap();

    // Render-only is a backfill tool: source frames stay on disk.
    assert_eq!(store.list_frames(1).len(), 2);
    assert_eq!(store.list_frames(4).len(), 1);
}

#[test]
fn test_render_only_isolates_per_session_failures() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());

    // Fail the first invocation, succeed afterwards.
    let state = dir.path().join("state");
    let body = format!(
        "if [ -e {state} ]; then exit 0; else touch {state}; exit 1; fi",
        state = state.display()
    );
    config.render.ffmpeg_path = stub_encoder(dir.path(), &body);

    touch_frame(&config, 1, 0);
    touch_frame(&config, 2, 0);

    // The batch completes despite session 1's encoder failure.
    controller(config).run(RunMode::RenderOnly).unwrap();
    assert!(state.exists());
}

#[test]
fn test_render_only_twice_feeds_encoder_identical_frame_sets() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());

    // Copy the playlist (argument 6) to the output (last argument).
    let body = r#"for a in "$@"; do last="$a"; done
cp "$6" "$last""#;
    config.render.ffmpeg_path = stub_encoder(dir.path(), body);

    for sequence in 0..3 {
        touch_frame(&config, 2, sequence);
    }

    let output = Path::new(&config.storage.video_dir).join("out2.mp4");

    controller(config.clone()).run(RunMode::RenderOnly).unwrap();
    let first = fs::read_to_string(&output).unwrap();

    controller(config).run(RunMode::RenderOnly).unwrap();
    let second = fs::read_to_string(&output).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.lines().filter(|l| l.starts_with("file ")).count(), 3);
}

#[test]
fn test_run_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let mut config = TimelapseConfig::default();
    config.storage.frames_dir = dir.path().join("f").to_string_lossy().into_owned();
    config.storage.video_dir = dir.path().join("v").to_string_lossy().into_owned();
    config.render.ffmpeg_path = "false".to_string();

    controller(config.clone()).run(RunMode::RenderOnly).unwrap();
    assert!(Path::new(&config.storage.frames_dir).exists());
    assert!(Path::new(&config.storage.video_dir).exists());
}
