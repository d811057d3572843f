//! Configuration management for crablapse
//!
//! Provides configuration loading and validation for capture cadence,
//! storage locations, encoder settings, and the optional portrait output.

use crate::errors::TimelapseError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelapseConfig {
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

/// Capture loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between successive frame captures
    pub interval_secs: u64,
    /// Total capture window per session, in seconds
    pub duration_secs: u64,
    /// Camera device indices to try, in order
    pub device_indices: Vec<u32>,
}

/// Frame storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding captured frame files
    pub frames_dir: String,
    /// Directory receiving assembled videos
    pub video_dir: String,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Write attempts per frame before giving up
    pub write_attempts: u32,
    /// Delay between write attempts in milliseconds
    pub write_retry_delay_ms: u64,
}

/// Video assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output frame rate
    pub fps: u32,
    /// x264 constant rate factor (0-51)
    pub crf: u32,
    /// x264 preset name
    pub preset: String,
    /// Encoder binary to invoke
    pub ffmpeg_path: String,
}

/// Output geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Rotate, crop, and scale frames to a portrait canvas
    pub portrait: bool,
    /// Portrait canvas width
    pub width: u32,
    /// Portrait canvas height
    pub height: u32,
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                interval_secs: 20,
                duration_secs: 2 * 60 * 60,
                device_indices: vec![0, 1, 2],
            },
            storage: StorageConfig {
                frames_dir: "frames".to_string(),
                video_dir: "videos".to_string(),
                jpeg_quality: 90,
                write_attempts: 3,
                write_retry_delay_ms: 100,
            },
            render: RenderConfig {
                fps: 25,
                crf: 23,
                preset: "fast".to_string(),
                ffmpeg_path: "ffmpeg".to_string(),
            },
            output: OutputConfig {
                portrait: false,
                width: 720,
                height: 1280,
            },
        }
    }
}

impl TimelapseConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TimelapseError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            TimelapseError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: TimelapseConfig = toml::from_str(&contents).map_err(|e| {
            TimelapseError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crablapse.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.capture.interval_secs == 0 {
            return Err("Capture interval must be at least 1 second".to_string());
        }
        if self.capture.duration_secs == 0 {
            return Err("Capture duration must be at least 1 second".to_string());
        }
        if self.capture.device_indices.is_empty() {
            return Err("At least one camera device index is required".to_string());
        }

        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if self.storage.write_attempts == 0 {
            return Err("Write attempts must be at least 1".to_string());
        }

        if self.render.fps == 0 || self.render.fps > 240 {
            return Err("FPS must be between 1 and 240".to_string());
        }
        if self.render.crf > 51 {
            return Err("CRF must be between 0 and 51".to_string());
        }
        if self.render.preset.is_empty() {
            return Err("Encoder preset must not be empty".to_string());
        }

        if self.output.width == 0 || self.output.height == 0 {
            return Err("Invalid output dimensions".to_string());
        }

        Ok(())
    }
}
