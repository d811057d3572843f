//! crablapse: webcam timelapse capture and video assembly
//!
//! Captures still frames from a webcam on a fixed cadence, persists them
//! as individually named JPEG files, and assembles each capture session
//! into an H.264 timelapse video by invoking ffmpeg.
//!
//! # Design
//! - The frames directory is the only durable state: session numbering
//!   and capture progress are derived from frame filenames, so nothing can
//!   drift out of sync with the frames actually on disk.
//! - Frames carry per-session sequence numbers assigned in strict capture
//!   order; renders always feed ffmpeg in that order.
//! - Interruption is cooperative: termination signals set a flag, the
//!   capture loop winds down within ~100ms, and the partial session is
//!   rendered before exit.
//!
//! # Usage
//! ```rust,no_run
//! use crablapse::{RunMode, TimelapseConfig, TimelapseController};
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! let config = TimelapseConfig::load_or_default();
//! let cancel = Arc::new(AtomicBool::new(false));
//! let controller = TimelapseController::new(config, cancel);
//! controller.run(RunMode::Capture).expect("timelapse run failed");
//! ```
pub mod camera;
pub mod capture;
pub mod config;
pub mod controller;
pub mod errors;
pub mod render;
pub mod session;
pub mod store;
pub mod transform;

// Re-exports for convenience
pub use config::TimelapseConfig;
pub use controller::{RunMode, TimelapseController};
pub use errors::TimelapseError;
pub use render::RenderPipeline;
pub use session::SessionLedger;
pub use store::FrameStore;

/// Initialize logging for the timelapse process
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crablapse=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
