// SPDX-License-Identifier: GPL-3.0-only

//! Camera lifecycle wrapper
//!
//! [`Camera`] provides:
//! - Opening the back-facing camera through a [`CameraPlatform`]
//! - Preview size selection against the open camera's stream configurations
//! - Starting and stopping one repeating preview stream
//! - Thread-safe access; clones share the same device

use super::events::CameraEventSink;
use super::preview::select_preview_size;
use super::types::*;
use super::{CameraPlatform, CameraService, find_back_facing_camera};
use crate::errors::{CameraError, CameraResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// A running preview stream
#[derive(Debug, Clone, Copy)]
struct ActiveStream {
    session: SessionHandle,
    surface: SurfaceHandle,
}

/// Internal camera state
///
/// `device` and `camera_id` are only set while `service` is.
#[derive(Default)]
struct CameraState {
    /// Camera manager; dropping it releases the manager
    service: Option<Box<dyn CameraService>>,
    camera_id: Option<CameraId>,
    device: Option<DeviceHandle>,
    stream: Option<ActiveStream>,
}

impl CameraState {
    fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Some(service) = self.service.as_mut() {
                service.stop_repeating(stream.session);
            }
            info!(surface = stream.surface.token(), "Preview stream stopped");
        }
    }

    fn close(&mut self) {
        self.stop_stream();
        if let Some(device) = self.device.take()
            && let Some(service) = self.service.as_mut()
        {
            service.close_device(device);
        }
        if let Some(id) = self.camera_id.take() {
            info!(camera = %id, "Camera closed");
        }
        self.service = None;
    }
}

impl Drop for CameraState {
    fn drop(&mut self) {
        self.close();
    }
}

/// Back-facing camera session wrapper
///
/// Thread-safe and can be shared across threads. The device is closed by
/// [`Camera::close`] or when the last clone is dropped.
#[derive(Clone)]
pub struct Camera {
    platform: Arc<dyn CameraPlatform>,
    events: Arc<dyn CameraEventSink>,
    state: Arc<Mutex<CameraState>>,
}

impl Camera {
    /// Create an unopened camera
    ///
    /// # Arguments
    /// * `platform` - Platform camera subsystem to drive
    /// * `events` - Receiver for device, session and capture callbacks
    pub fn new(platform: Arc<dyn CameraPlatform>, events: Arc<dyn CameraEventSink>) -> Self {
        Self {
            platform,
            events,
            state: Arc::new(Mutex::new(CameraState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CameraState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the camera manager and open the first back-facing camera
    ///
    /// # Returns
    /// * `Ok(())` - Device open
    /// * `Err(CameraError::ManagerCreationFailed)` - No camera manager
    /// * `Err(CameraError::OpenFailed)` - No back-facing camera, or the
    ///   platform rejected the open
    /// * `Err(CameraError::AlreadyOpen)` - Already open
    pub fn open(&self) -> CameraResult<()> {
        let mut state = self.lock();
        if state.service.is_some() {
            return Err(CameraError::AlreadyOpen);
        }

        let mut service = self
            .platform
            .create_manager()
            .map_err(CameraError::ManagerCreationFailed)?;

        let camera_id = find_back_facing_camera(service.as_ref())
            .map_err(|e| CameraError::OpenFailed {
                camera: None,
                reason: e.to_string(),
            })?
            .ok_or_else(|| CameraError::OpenFailed {
                camera: None,
                reason: "no back-facing camera".to_string(),
            })?;
        debug!(camera = %camera_id, "Found back-facing camera");

        let device = service
            .open_device(&camera_id, Arc::clone(&self.events))
            .map_err(|e| CameraError::OpenFailed {
                camera: Some(camera_id.clone()),
                reason: e.to_string(),
            })?;

        info!(camera = %camera_id, "Camera opened");
        state.service = Some(service);
        state.camera_id = Some(camera_id);
        state.device = Some(device);
        Ok(())
    }

    /// Select the preview size for a display window
    ///
    /// See [`select_preview_size`]; [`Dimensions::ZERO`] means no
    /// advertised size fits the window.
    pub fn preview_size(&self, window_width: u32, window_height: u32) -> CameraResult<Dimensions> {
        let state = self.lock();
        let (Some(service), Some(camera_id)) = (state.service.as_ref(), state.camera_id.as_ref())
        else {
            return Err(CameraError::NotOpen);
        };

        let characteristics = service.characteristics(camera_id)?;
        Ok(select_preview_size(
            window_width,
            window_height,
            &characteristics.stream_configurations,
        ))
    }

    /// Start a repeating preview request that renders into `surface`
    ///
    /// Any stream already running is stopped first.
    pub fn start_stream(&self, surface: SurfaceHandle) -> CameraResult<()> {
        let mut state = self.lock();
        let Some(device) = state.device else {
            return Err(CameraError::StreamStartFailed(
                "camera device is not open".to_string(),
            ));
        };

        state.stop_stream();

        let service = state
            .service
            .as_mut()
            .ok_or_else(|| CameraError::StreamStartFailed("no camera manager".to_string()))?;
        let session = service
            .start_repeating(
                device,
                &surface,
                RequestTemplate::Preview,
                Arc::clone(&self.events),
            )
            .map_err(|e| CameraError::StreamStartFailed(e.to_string()))?;

        info!(surface = surface.token(), "Preview stream started");
        state.stream = Some(ActiveStream { session, surface });
        Ok(())
    }

    /// Stop the preview stream and release its surface. No-op when idle.
    pub fn stop_stream(&self) {
        self.lock().stop_stream();
    }

    /// Stop streaming, close the device and release the camera manager
    pub fn close(&self) {
        self.lock().close();
    }

    pub fn is_open(&self) -> bool {
        self.lock().device.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().stream.is_some()
    }

    /// Id of the open camera
    pub fn camera_id(&self) -> Option<CameraId> {
        self.lock().camera_id.clone()
    }

    /// Surface of the running stream
    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.lock().stream.map(|s| s.surface)
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Camera")
            .field("camera_id", &state.camera_id)
            .field("open", &state.device.is_some())
            .field("streaming", &state.stream.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::events::{CameraEvent, CaptureEvent, NoopEventSink, SessionEvent};
    use crate::backends::camera::virtual_platform::{
        CameraSetup, VirtualCameraPlatform, VirtualCameraSpec,
    };
    use std::sync::{OnceLock, mpsc};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<CameraEvent>>);

    impl CameraEventSink for RecordingSink {
        fn on_event(&self, event: CameraEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn camera_with(setup: CameraSetup) -> (Camera, Arc<VirtualCameraPlatform>) {
        let platform = Arc::new(VirtualCameraPlatform::new(setup));
        let camera = Camera::new(platform.clone(), Arc::new(NoopEventSink));
        (camera, platform)
    }

    fn surface() -> SurfaceHandle {
        SurfaceHandle::from_token(0xbeef).unwrap()
    }

    #[test]
    fn test_open_selects_back_camera() {
        let setup = CameraSetup {
            cameras: vec![
                VirtualCameraSpec::new("front", Some(LensFacing::Front), vec![]),
                VirtualCameraSpec::new("external", None, vec![]),
                VirtualCameraSpec::new("back", Some(LensFacing::Back), vec![]),
            ],
            ..CameraSetup::empty()
        };
        let (camera, platform) = camera_with(setup);

        camera.open().unwrap();
        assert!(camera.is_open());
        assert_eq!(camera.camera_id(), Some(CameraId::new("back")));
        assert_eq!(platform.log().opened_devices, vec![CameraId::new("back")]);
    }

    #[test]
    fn test_open_without_back_camera_fails() {
        let setup = CameraSetup {
            cameras: vec![VirtualCameraSpec::new("1", Some(LensFacing::Front), vec![])],
            ..CameraSetup::empty()
        };
        let (camera, platform) = camera_with(setup);

        let err = camera.open().unwrap_err();
        assert!(matches!(err, CameraError::OpenFailed { camera: None, .. }));
        assert!(!camera.is_open());
        // The manager created for the attempt was released
        let log = platform.log();
        assert_eq!(log.managers_created, 1);
        assert_eq!(log.managers_released, 1);
    }

    #[test]
    fn test_manager_creation_failure() {
        let setup = CameraSetup {
            fail_manager_creation: true,
            ..CameraSetup::default()
        };
        let (camera, _platform) = camera_with(setup);

        assert!(matches!(
            camera.open(),
            Err(CameraError::ManagerCreationFailed(_))
        ));
    }

    #[test]
    fn test_device_open_rejected() {
        let setup = CameraSetup {
            fail_open: true,
            ..CameraSetup::default()
        };
        let (camera, _platform) = camera_with(setup);

        match camera.open() {
            Err(CameraError::OpenFailed {
                camera: Some(id), ..
            }) => assert_eq!(id, CameraId::new("0")),
            other => panic!("expected OpenFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_open_twice() {
        let (camera, _platform) = camera_with(CameraSetup::default());
        camera.open().unwrap();
        assert_eq!(camera.open(), Err(CameraError::AlreadyOpen));
    }

    #[test]
    fn test_preview_size_requires_open_camera() {
        let (camera, _platform) = camera_with(CameraSetup::default());
        assert_eq!(camera.preview_size(1080, 1920), Err(CameraError::NotOpen));
    }

    #[test]
    fn test_preview_size_uses_back_camera_configurations() {
        let (camera, _platform) = camera_with(CameraSetup::default());
        camera.open().unwrap();
        assert_eq!(
            camera.preview_size(1080, 1920).unwrap(),
            Dimensions::new(1920, 1080)
        );
    }

    #[test]
    fn test_start_stream_requires_open_device() {
        let (camera, platform) = camera_with(CameraSetup::default());
        assert!(matches!(
            camera.start_stream(surface()),
            Err(CameraError::StreamStartFailed(_))
        ));
        assert_eq!(platform.log().repeating_requests, 0);
    }

    #[test]
    fn test_stream_lifecycle_delivers_events() {
        let platform = Arc::new(VirtualCameraPlatform::new(CameraSetup::default()));
        let sink = Arc::new(RecordingSink::default());
        let camera = Camera::new(platform.clone(), sink.clone());

        camera.open().unwrap();
        camera.start_stream(surface()).unwrap();
        assert!(camera.is_streaming());
        assert_eq!(camera.surface(), Some(surface()));
        assert_eq!(platform.log().surfaces_in_use, vec![surface()]);

        camera.stop_stream();
        assert!(!camera.is_streaming());
        let log = platform.log();
        assert!(log.surfaces_in_use.is_empty());
        assert_eq!(log.released_surfaces, vec![surface()]);

        platform.wait_for_events();
        let events = sink.0.lock().unwrap().clone();
        assert_eq!(events.first(), Some(&CameraEvent::Session(SessionEvent::Active)));
        assert!(events.contains(&CameraEvent::Capture(CaptureEvent::Started { timestamp_ns: 0 })));
        assert_eq!(events.last(), Some(&CameraEvent::Session(SessionEvent::Closed)));
    }

    #[test]
    fn test_failed_stream_start_leaves_nothing_running() {
        let setup = CameraSetup {
            fail_stream_start: true,
            ..CameraSetup::default()
        };
        let (camera, platform) = camera_with(setup);
        camera.open().unwrap();

        assert!(matches!(
            camera.start_stream(surface()),
            Err(CameraError::StreamStartFailed(_))
        ));
        assert!(!camera.is_streaming());
        assert_eq!(camera.surface(), None);
        let log = platform.log();
        assert!(log.surfaces_in_use.is_empty());
        assert_eq!(log.released_surfaces, vec![surface()]);
        // The device stays open for another attempt
        assert!(camera.is_open());
    }

    /// Sink that queries the camera it is attached to
    #[derive(Default)]
    struct QueryingSink {
        camera: OnceLock<Camera>,
        streaming_on_active: Mutex<Vec<bool>>,
    }

    impl CameraEventSink for QueryingSink {
        fn on_event(&self, event: CameraEvent) {
            if event == CameraEvent::Session(SessionEvent::Active)
                && let Some(camera) = self.camera.get()
            {
                let streaming = camera.is_streaming();
                self.streaming_on_active.lock().unwrap().push(streaming);
            }
        }
    }

    #[test]
    fn test_sink_can_query_camera_during_start() {
        let platform = Arc::new(VirtualCameraPlatform::new(CameraSetup::default()));
        let sink = Arc::new(QueryingSink::default());
        let camera = Camera::new(platform.clone(), sink.clone());
        assert!(sink.camera.set(camera.clone()).is_ok());
        camera.open().unwrap();

        let (done, result) = mpsc::channel();
        let worker = camera.clone();
        std::thread::spawn(move || {
            let _ = done.send(worker.start_stream(surface()));
        });
        let started = result
            .recv_timeout(Duration::from_secs(3))
            .expect("start_stream did not return");
        assert_eq!(started, Ok(()));

        platform.wait_for_events();
        assert_eq!(*sink.streaming_on_active.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_restarting_stream_replaces_session() {
        let (camera, platform) = camera_with(CameraSetup::default());
        let other = SurfaceHandle::from_token(0xcafe).unwrap();

        camera.open().unwrap();
        camera.start_stream(surface()).unwrap();
        camera.start_stream(other).unwrap();

        let log = platform.log();
        assert_eq!(log.repeating_requests, 2);
        assert_eq!(log.surfaces_in_use, vec![other]);
        assert_eq!(log.released_surfaces, vec![surface()]);
    }

    #[test]
    fn test_stop_stream_when_idle_is_noop() {
        let (camera, platform) = camera_with(CameraSetup::default());
        camera.open().unwrap();
        camera.stop_stream();
        assert!(platform.log().released_surfaces.is_empty());
    }

    #[test]
    fn test_close_releases_everything_once() {
        let (camera, platform) = camera_with(CameraSetup::default());
        camera.open().unwrap();
        camera.start_stream(surface()).unwrap();

        camera.close();
        camera.close();

        assert!(!camera.is_open());
        assert_eq!(camera.camera_id(), None);
        let log = platform.log();
        assert_eq!(log.closed_devices, vec![CameraId::new("0")]);
        assert_eq!(log.released_surfaces, vec![surface()]);
        assert_eq!(log.managers_released, 1);
    }

    #[test]
    fn test_reopen_after_close() {
        let (camera, platform) = camera_with(CameraSetup::default());
        camera.open().unwrap();
        camera.close();
        camera.open().unwrap();
        assert!(camera.is_open());
        assert_eq!(platform.log().managers_created, 2);
    }

    #[test]
    fn test_drop_of_last_clone_closes_device() {
        let (camera, platform) = camera_with(CameraSetup::default());
        let clone = camera.clone();
        camera.open().unwrap();
        clone.start_stream(surface()).unwrap();

        drop(camera);
        assert!(platform.log().closed_devices.is_empty());

        drop(clone);
        let log = platform.log();
        assert_eq!(log.closed_devices, vec![CameraId::new("0")]);
        assert_eq!(log.released_surfaces, vec![surface()]);
    }
}
