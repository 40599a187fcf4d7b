// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera wrapper

use crate::backends::camera::{BackendError, CameraId};
use std::fmt;

/// Result type alias using CameraError
pub type CameraResult<T> = Result<T, CameraError>;

/// Camera-level errors
///
/// Manager creation and device open failures are fatal to the caller;
/// nothing here retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The platform could not create a camera manager
    ManagerCreationFailed(BackendError),
    /// The back-facing camera could not be opened. `camera` is `None` when
    /// no back-facing camera exists.
    OpenFailed {
        camera: Option<CameraId>,
        reason: String,
    },
    /// Streaming could not start (no open device, or the session failed)
    StreamStartFailed(String),
    /// Operation needs an open camera
    NotOpen,
    /// `open` called on an already open camera
    AlreadyOpen,
    /// Query against the camera service failed
    Backend(BackendError),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::ManagerCreationFailed(e) => {
                write!(f, "Failed to create camera manager: {}", e)
            }
            CameraError::OpenFailed {
                camera: Some(id),
                reason,
            } => write!(f, "Failed to open camera {}: {}", id, reason),
            CameraError::OpenFailed {
                camera: None,
                reason,
            } => write!(f, "Failed to open camera: {}", reason),
            CameraError::StreamStartFailed(msg) => write!(f, "Failed to start stream: {}", msg),
            CameraError::NotOpen => write!(f, "Camera is not open"),
            CameraError::AlreadyOpen => write!(f, "Camera is already open"),
            CameraError::Backend(e) => write!(f, "Camera service error: {}", e),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::ManagerCreationFailed(e) | CameraError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        CameraError::Backend(err)
    }
}

/// Errors reading configuration or camera setup files
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failed_display_without_camera() {
        let err = CameraError::OpenFailed {
            camera: None,
            reason: "no back-facing camera".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to open camera: no back-facing camera"
        );
    }

    #[test]
    fn test_open_failed_display_with_camera() {
        let err = CameraError::OpenFailed {
            camera: Some(CameraId::new("0")),
            reason: BackendError::CameraInUse.to_string(),
        };
        assert_eq!(err.to_string(), "Failed to open camera 0: Camera is in use");
    }

    #[test]
    fn test_backend_error_converts() {
        let err: CameraError = BackendError::Disconnected.into();
        assert_eq!(err, CameraError::Backend(BackendError::Disconnected));
        assert!(std::error::Error::source(&err).is_some());
    }
}
