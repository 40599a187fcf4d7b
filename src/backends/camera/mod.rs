// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The platform camera service owns device arbitration, buffer queues and
//! session state. This module only drives it through two traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │       Camera        │  ← open / preview size / start / stop / close
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraPlatform     │  ← creates the camera manager
//! │  CameraService      │  ← ids, characteristics, devices, sessions
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌───────┐  ┌───────┐
//!   │Virtual│  │  NDK  │
//!   └───────┘  └───────┘
//! ```

pub mod events;
pub mod manager;
#[cfg(target_os = "android")]
pub mod ndk;
pub mod preview;
pub mod types;
pub mod virtual_platform;

pub use events::{
    CameraEvent, CameraEventSink, CaptureEvent, DeviceEvent, LoggingEventSink, NoopEventSink,
    SessionEvent,
};
pub use manager::Camera;
#[cfg(target_os = "android")]
pub use ndk::NdkCameraPlatform;
pub use preview::select_preview_size;
pub use types::*;
pub use virtual_platform::{
    CameraSetup, VirtualCameraPlatform, VirtualCameraSpec, VirtualLog,
};

use std::sync::Arc;
use tracing::warn;

/// Entry point into a platform camera subsystem
pub trait CameraPlatform: Send + Sync {
    /// Create a camera manager
    ///
    /// # Returns
    /// * `Ok(service)` - Manager ready for queries
    /// * `Err(BackendError)` - The platform could not create one
    fn create_manager(&self) -> BackendResult<Box<dyn CameraService>>;
}

/// Camera manager created by a [`CameraPlatform`]
///
/// Dropping the service releases the manager.
pub trait CameraService: Send {
    // ===== Enumeration =====

    /// Ids of all cameras, in platform order
    fn camera_ids(&self) -> BackendResult<Vec<CameraId>>;

    /// Static characteristics of one camera
    fn characteristics(&self, id: &CameraId) -> BackendResult<CameraCharacteristics>;

    // ===== Device =====

    /// Open a device. Device state callbacks go to `events`.
    fn open_device(
        &mut self,
        id: &CameraId,
        events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<DeviceHandle>;

    /// Close a device previously opened by this service
    fn close_device(&mut self, device: DeviceHandle);

    // ===== Session =====

    /// Create a capture session with `surface` as its only output and issue
    /// a repeating request built from `template`. Session state and capture
    /// callbacks go to `events`.
    fn start_repeating(
        &mut self,
        device: DeviceHandle,
        surface: &SurfaceHandle,
        template: RequestTemplate,
        events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<SessionHandle>;

    /// Stop the repeating request, close the session and release its
    /// outputs, request and surface reference
    fn stop_repeating(&mut self, session: SessionHandle);
}

/// Find the first camera whose lens faces away from the screen
///
/// Cameras whose characteristics cannot be read are skipped.
pub fn find_back_facing_camera(service: &dyn CameraService) -> BackendResult<Option<CameraId>> {
    for id in service.camera_ids()? {
        match service.characteristics(&id) {
            Ok(characteristics) if characteristics.is_back_facing() => return Ok(Some(id)),
            Ok(_) => {}
            Err(e) => {
                warn!(camera = %id, error = %e, "Skipping camera with unreadable characteristics")
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Service whose first camera cannot be queried
    struct FlakyService;

    impl CameraService for FlakyService {
        fn camera_ids(&self) -> BackendResult<Vec<CameraId>> {
            Ok(vec![CameraId::new("broken"), CameraId::new("back")])
        }

        fn characteristics(&self, id: &CameraId) -> BackendResult<CameraCharacteristics> {
            if id.as_str() == "broken" {
                return Err(BackendError::Disconnected);
            }
            Ok(CameraCharacteristics {
                lens_facing: Some(LensFacing::Back),
                stream_configurations: Vec::new(),
            })
        }

        fn open_device(
            &mut self,
            _id: &CameraId,
            _events: Arc<dyn CameraEventSink>,
        ) -> BackendResult<DeviceHandle> {
            Err(BackendError::CameraInUse)
        }

        fn close_device(&mut self, _device: DeviceHandle) {}

        fn start_repeating(
            &mut self,
            _device: DeviceHandle,
            _surface: &SurfaceHandle,
            _template: RequestTemplate,
            _events: Arc<dyn CameraEventSink>,
        ) -> BackendResult<SessionHandle> {
            Err(BackendError::CameraInUse)
        }

        fn stop_repeating(&mut self, _session: SessionHandle) {}
    }

    #[test]
    fn test_back_camera_search_skips_unreadable_camera() {
        assert_eq!(
            find_back_facing_camera(&FlakyService).unwrap(),
            Some(CameraId::new("back"))
        );
    }
}
