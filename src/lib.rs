// SPDX-License-Identifier: GPL-3.0-only

//! Simple Camera - back-facing camera preview on top of a platform camera service
//!
//! The crate opens the first back-facing camera, picks the preview size
//! closest to a display window, and runs one repeating preview request into
//! a display surface. Device arbitration and session state belong to the
//! platform; the crate only drives it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: platform traits, the [`Camera`] wrapper, preview size
//!   selection, and the virtual and Android NDK platforms
//! - [`config`]: user configuration handling
//! - [`constants`]: platform codes and defaults
//! - [`errors`]: error types
//!
//! # Example
//!
//! ```ignore
//! use simple_camera::{Camera, LoggingEventSink, SurfaceHandle, VirtualCameraPlatform};
//! use std::sync::Arc;
//!
//! let camera = Camera::new(
//!     Arc::new(VirtualCameraPlatform::default()),
//!     Arc::new(LoggingEventSink),
//! );
//! camera.open()?;
//! let size = camera.preview_size(1080, 1920)?;
//! camera.start_stream(SurfaceHandle::from_token(1).unwrap())?;
//! camera.close();
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use backends::camera::{
    Camera, CameraEvent, CameraEventSink, CameraPlatform, CameraService, CameraSetup, Dimensions,
    LoggingEventSink, PixelFormat, StreamConfiguration, StreamDirection, SurfaceHandle,
    VirtualCameraPlatform, select_preview_size,
};
pub use config::Config;
pub use errors::{CameraError, CameraResult};
