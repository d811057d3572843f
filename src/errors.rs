use std::fmt;

#[derive(Debug)]
pub enum TimelapseError {
    DeviceUnavailable(String),
    CaptureError(String),
    PersistenceError(String),
    NoFramesFound(u64),
    EncodeError(String),
    ConfigError(String),
}

impl fmt::Display for TimelapseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimelapseError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            TimelapseError::CaptureError(msg) => write!(f, "Capture error: {}", msg),
            TimelapseError::PersistenceError(msg) => write!(f, "Frame persistence error: {}", msg),
            TimelapseError::NoFramesFound(session) => {
                write!(f, "No frames found for session {}", session)
            }
            TimelapseError::EncodeError(msg) => write!(f, "Encoder error: {}", msg),
            TimelapseError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for TimelapseError {}
