// SPDX-License-Identifier: GPL-3.0-only

//! Android NDK camera platform
//!
//! Binds `ACameraManager` and friends through `ndk-sys`. Every native
//! object is owned by a small RAII wrapper; C callbacks forward into the
//! [`CameraEventSink`] registered with the device or session.

mod callbacks;

use super::events::CameraEventSink;
use super::types::*;
use super::{CameraPlatform, CameraService};
use callbacks::{CallbackContext, capture_callbacks, device_callbacks, session_callbacks};
use ndk_sys::{
    ACameraCaptureSession, ACameraCaptureSession_captureCallbacks, ACameraCaptureSession_close,
    ACameraCaptureSession_setRepeatingRequest, ACameraCaptureSession_stateCallbacks,
    ACameraCaptureSession_stopRepeating, ACameraDevice, ACameraDevice_StateCallbacks,
    ACameraDevice_close, ACameraDevice_createCaptureRequest, ACameraDevice_createCaptureSession,
    ACameraDevice_request_template, ACameraIdList, ACameraManager, ACameraManager_create,
    ACameraManager_delete, ACameraManager_deleteCameraIdList,
    ACameraManager_getCameraCharacteristics, ACameraManager_getCameraIdList,
    ACameraManager_openCamera, ACameraMetadata, ACameraMetadata_const_entry,
    ACameraMetadata_free, ACameraMetadata_getConstEntry, ACameraOutputTarget,
    ACameraOutputTarget_create, ACameraOutputTarget_free, ACaptureRequest,
    ACaptureRequest_addTarget, ACaptureRequest_free, ACaptureSessionOutput,
    ACaptureSessionOutputContainer, ACaptureSessionOutputContainer_add, ACaptureSessionOutputContainer_create,
    ACaptureSessionOutputContainer_free, ACaptureSessionOutput_create, ACaptureSessionOutput_free,
    ANativeWindow, ANativeWindow_acquire, ANativeWindow_release, acamera_metadata_tag,
    camera_status_t,
};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::ptr::null_mut;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn check(status: camera_status_t) -> BackendResult<()> {
    if status == camera_status_t::ACAMERA_OK {
        return Ok(());
    }
    Err(match status {
        s if s == camera_status_t::ACAMERA_ERROR_INVALID_PARAMETER => {
            BackendError::InvalidParameter(format!("status {}", s.0))
        }
        s if s == camera_status_t::ACAMERA_ERROR_PERMISSION_DENIED => {
            BackendError::PermissionDenied
        }
        s if s == camera_status_t::ACAMERA_ERROR_CAMERA_IN_USE
            || s == camera_status_t::ACAMERA_ERROR_MAX_CAMERA_IN_USE =>
        {
            BackendError::CameraInUse
        }
        s if s == camera_status_t::ACAMERA_ERROR_CAMERA_DISCONNECTED => BackendError::Disconnected,
        s => BackendError::Status(s.0),
    })
}

/// The Android camera subsystem
#[derive(Debug, Default, Clone, Copy)]
pub struct NdkCameraPlatform;

impl CameraPlatform for NdkCameraPlatform {
    fn create_manager(&self) -> BackendResult<Box<dyn CameraService>> {
        let manager = unsafe { ACameraManager_create() };
        if manager.is_null() {
            return Err(BackendError::NotAvailable(
                "ACameraManager_create returned null".to_string(),
            ));
        }
        info!("Camera manager created");
        Ok(Box::new(NdkCameraService {
            manager,
            next_handle: 1,
            devices: HashMap::new(),
            sessions: HashMap::new(),
        }))
    }
}

/// Characteristics metadata, freed on drop
struct Metadata(*mut ACameraMetadata);

impl Metadata {
    fn entry(&self, tag: acamera_metadata_tag) -> Option<ACameraMetadata_const_entry> {
        let mut entry: ACameraMetadata_const_entry = unsafe { std::mem::zeroed() };
        let status = unsafe { ACameraMetadata_getConstEntry(self.0, tag.0, &mut entry) };
        (status == camera_status_t::ACAMERA_OK).then_some(entry)
    }

    fn lens_facing(&self) -> Option<LensFacing> {
        let entry = self.entry(acamera_metadata_tag::ACAMERA_LENS_FACING)?;
        if entry.count == 0 {
            return None;
        }
        LensFacing::from_code(unsafe { *entry.data.u8_ })
    }

    fn stream_configurations(&self) -> Vec<StreamConfiguration> {
        let Some(entry) =
            self.entry(acamera_metadata_tag::ACAMERA_SCALER_AVAILABLE_STREAM_CONFIGURATIONS)
        else {
            return Vec::new();
        };
        if entry.count == 0 {
            return Vec::new();
        }
        let values = unsafe { std::slice::from_raw_parts(entry.data.i32_, entry.count as usize) };
        StreamConfiguration::parse_flat(values)
    }
}

impl Drop for Metadata {
    fn drop(&mut self) {
        unsafe { ACameraMetadata_free(self.0) }
    }
}

/// Callback tables and context registered with one capture session
///
/// Stopping and closing a session complete on the NDK callback thread, so
/// sequence and `onClosed` callbacks still arrive after the session is
/// dropped. The owning [`NdkDevice`] keeps these alive until
/// `ACameraDevice_close`, which joins that thread.
struct SessionCallbacks {
    state: Box<ACameraCaptureSession_stateCallbacks>,
    capture: Box<ACameraCaptureSession_captureCallbacks>,
    _context: Box<CallbackContext>,
}

impl SessionCallbacks {
    fn new(events: Arc<dyn CameraEventSink>) -> Self {
        let context = Box::new(CallbackContext::new(events));
        let raw = context.as_raw();
        Self {
            state: Box::new(session_callbacks(raw)),
            capture: Box::new(capture_callbacks(raw)),
            _context: context,
        }
    }
}

/// An open device and the callback contexts it reports into
struct NdkDevice {
    handle: *mut ACameraDevice,
    callbacks: Box<ACameraDevice_StateCallbacks>,
    _context: Box<CallbackContext>,
    /// Contexts of every session created on this device, freed after close
    session_callbacks: Vec<SessionCallbacks>,
}

impl Drop for NdkDevice {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraDevice_close(self.handle) };
            self.handle = null_mut();
        }
        // Contexts are dropped with the fields, after the close above
    }
}

/// A repeating capture session and everything it holds
///
/// Fields start null and are filled as the session is built, so a
/// partially built session is torn down correctly on drop.
struct NdkSession {
    device: DeviceHandle,
    window: *mut ANativeWindow,
    request: *mut ACaptureRequest,
    output: *mut ACaptureSessionOutput,
    container: *mut ACaptureSessionOutputContainer,
    target: *mut ACameraOutputTarget,
    session: *mut ACameraCaptureSession,
    repeating: bool,
    /// Owned by the device's `session_callbacks`
    state_callbacks: *const ACameraCaptureSession_stateCallbacks,
    capture_callbacks: *mut ACameraCaptureSession_captureCallbacks,
}

impl NdkSession {
    fn new(device: DeviceHandle, callbacks: &mut SessionCallbacks) -> Self {
        Self {
            device,
            window: null_mut(),
            request: null_mut(),
            output: null_mut(),
            container: null_mut(),
            target: null_mut(),
            session: null_mut(),
            repeating: false,
            state_callbacks: &*callbacks.state,
            capture_callbacks: &mut *callbacks.capture,
        }
    }

    fn start(
        &mut self,
        device: *mut ACameraDevice,
        window: *mut ANativeWindow,
        template: RequestTemplate,
    ) -> BackendResult<()> {
        let template = match template {
            RequestTemplate::Preview => ACameraDevice_request_template::TEMPLATE_PREVIEW,
        };

        unsafe {
            check(ACameraDevice_createCaptureRequest(
                device,
                template,
                &mut self.request,
            ))?;

            check(ACaptureSessionOutput_create(window, &mut self.output))?;
            check(ACaptureSessionOutputContainer_create(&mut self.container))?;
            check(ACaptureSessionOutputContainer_add(
                self.container,
                self.output,
            ))?;

            ANativeWindow_acquire(window);
            self.window = window;
            check(ACameraOutputTarget_create(window, &mut self.target))?;
            check(ACaptureRequest_addTarget(self.request, self.target))?;

            check(ACameraDevice_createCaptureSession(
                device,
                self.container,
                self.state_callbacks,
                &mut self.session,
            ))?;

            check(ACameraCaptureSession_setRepeatingRequest(
                self.session,
                self.capture_callbacks,
                1,
                &mut self.request,
                null_mut(),
            ))?;
        }
        self.repeating = true;
        Ok(())
    }
}

impl Drop for NdkSession {
    fn drop(&mut self) {
        unsafe {
            if !self.session.is_null() {
                if self.repeating {
                    ACameraCaptureSession_stopRepeating(self.session);
                }
                ACameraCaptureSession_close(self.session);
            }
            if !self.container.is_null() {
                ACaptureSessionOutputContainer_free(self.container);
            }
            if !self.output.is_null() {
                ACaptureSessionOutput_free(self.output);
            }
            if !self.target.is_null() {
                ACameraOutputTarget_free(self.target);
            }
            if !self.window.is_null() {
                ANativeWindow_release(self.window);
            }
            if !self.request.is_null() {
                ACaptureRequest_free(self.request);
            }
        }
    }
}

struct NdkCameraService {
    manager: *mut ACameraManager,
    next_handle: u64,
    devices: HashMap<DeviceHandle, NdkDevice>,
    sessions: HashMap<SessionHandle, NdkSession>,
}

// SAFETY: the NDK camera objects may be used from any thread; the service
// is only ever accessed behind the camera mutex.
unsafe impl Send for NdkCameraService {}

impl NdkCameraService {
    fn metadata(&self, id: &CameraId) -> BackendResult<Metadata> {
        let c_id = CString::new(id.as_str())
            .map_err(|_| BackendError::InvalidParameter(format!("camera id '{}'", id)))?;
        let mut metadata: *mut ACameraMetadata = null_mut();
        check(unsafe {
            ACameraManager_getCameraCharacteristics(self.manager, c_id.as_ptr(), &mut metadata)
        })?;
        Ok(Metadata(metadata))
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl CameraService for NdkCameraService {
    fn camera_ids(&self) -> BackendResult<Vec<CameraId>> {
        let mut list: *mut ACameraIdList = null_mut();
        check(unsafe { ACameraManager_getCameraIdList(self.manager, &mut list) })?;

        let ids = unsafe {
            let count = usize::try_from((*list).numCameras).unwrap_or(0);
            let ids = (0..count)
                .map(|i| {
                    let raw = *(*list).cameraIds.add(i);
                    CameraId::new(CStr::from_ptr(raw).to_string_lossy().into_owned())
                })
                .collect();
            ACameraManager_deleteCameraIdList(list);
            ids
        };
        Ok(ids)
    }

    fn characteristics(&self, id: &CameraId) -> BackendResult<CameraCharacteristics> {
        let metadata = self.metadata(id)?;
        Ok(CameraCharacteristics {
            lens_facing: metadata.lens_facing(),
            stream_configurations: metadata.stream_configurations(),
        })
    }

    fn open_device(
        &mut self,
        id: &CameraId,
        events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<DeviceHandle> {
        let c_id = CString::new(id.as_str())
            .map_err(|_| BackendError::InvalidParameter(format!("camera id '{}'", id)))?;
        let context = Box::new(CallbackContext::new(events));
        let mut device = NdkDevice {
            handle: null_mut(),
            callbacks: Box::new(device_callbacks(context.as_raw())),
            _context: context,
            session_callbacks: Vec::new(),
        };
        check(unsafe {
            ACameraManager_openCamera(
                self.manager,
                c_id.as_ptr(),
                &mut *device.callbacks,
                &mut device.handle,
            )
        })?;

        let handle = DeviceHandle(self.next_handle());
        debug!(camera = %id, "NDK camera device opened");
        self.devices.insert(handle, device);
        Ok(handle)
    }

    fn close_device(&mut self, device: DeviceHandle) {
        // Sessions go first; their callback tables live in the device
        self.sessions.retain(|_, session| session.device != device);
        if self.devices.remove(&device).is_none() {
            warn!(?device, "Close requested for unknown device");
        }
    }

    fn start_repeating(
        &mut self,
        device: DeviceHandle,
        surface: &SurfaceHandle,
        template: RequestTemplate,
        events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<SessionHandle> {
        let ndk_device = self
            .devices
            .get_mut(&device)
            .ok_or_else(|| BackendError::InvalidParameter(format!("unknown device {:?}", device)))?;

        // The tables are boxed, so their addresses survive the move into the device
        let mut callbacks = SessionCallbacks::new(events);
        let mut session = NdkSession::new(device, &mut callbacks);
        ndk_device.session_callbacks.push(callbacks);
        session.start(ndk_device.handle, surface.as_ptr().cast(), template)?;

        let handle = SessionHandle(self.next_handle());
        self.sessions.insert(handle, session);
        Ok(handle)
    }

    fn stop_repeating(&mut self, session: SessionHandle) {
        self.sessions.remove(&session);
    }
}

impl Drop for NdkCameraService {
    fn drop(&mut self) {
        self.sessions.clear();
        self.devices.clear();
        unsafe { ACameraManager_delete(self.manager) };
        info!("Camera manager deleted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::events::NoopEventSink;

    #[test]
    fn test_session_context_outlives_session_until_device_close() {
        let sink: Arc<dyn CameraEventSink> = Arc::new(NoopEventSink);
        let context = Box::new(CallbackContext::new(Arc::new(NoopEventSink)));
        let mut device = NdkDevice {
            handle: null_mut(),
            callbacks: Box::new(device_callbacks(context.as_raw())),
            _context: context,
            session_callbacks: Vec::new(),
        };

        let mut callbacks = SessionCallbacks::new(Arc::clone(&sink));
        let session = NdkSession::new(DeviceHandle(1), &mut callbacks);
        device.session_callbacks.push(callbacks);
        assert_eq!(Arc::strong_count(&sink), 2);

        // Late callbacks after the session is gone still find their context
        drop(session);
        assert_eq!(Arc::strong_count(&sink), 2);

        drop(device);
        assert_eq!(Arc::strong_count(&sink), 1);
    }
}
