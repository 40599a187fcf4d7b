// SPDX-License-Identifier: GPL-3.0-only

//! C callback trampolines
//!
//! Each callback table carries a pointer to a boxed [`CallbackContext`].
//! Device and session contexts are owned by the device and freed only
//! after `ACameraDevice_close`, so late session callbacks stay valid.

use crate::backends::camera::events::{
    CameraEvent, CameraEventSink, CaptureEvent, DeviceEvent, SessionEvent,
};
use ndk_sys::{
    ACameraCaptureFailure, ACameraCaptureSession, ACameraCaptureSession_captureCallbacks,
    ACameraCaptureSession_stateCallbacks, ACameraDevice, ACameraDevice_StateCallbacks,
    ACameraMetadata, ACaptureRequest, ANativeWindow,
};
use std::ffi::{c_int, c_void};
use std::sync::Arc;

pub(super) struct CallbackContext {
    events: Arc<dyn CameraEventSink>,
}

impl CallbackContext {
    pub(super) fn new(events: Arc<dyn CameraEventSink>) -> Self {
        Self { events }
    }

    /// Address handed to the platform as callback context
    pub(super) fn as_raw(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

/// SAFETY: `context` must come from [`CallbackContext::as_raw`] on a live context
unsafe fn dispatch(context: *mut c_void, event: impl Into<CameraEvent>) {
    if let Some(ctx) = unsafe { (context as *const CallbackContext).as_ref() } {
        ctx.events.on_event(event.into());
    }
}

// ===== Device =====

unsafe extern "C" fn on_disconnected(context: *mut c_void, _device: *mut ACameraDevice) {
    unsafe { dispatch(context, DeviceEvent::Disconnected) }
}

unsafe extern "C" fn on_error(context: *mut c_void, _device: *mut ACameraDevice, error: c_int) {
    unsafe { dispatch(context, DeviceEvent::Error(error)) }
}

pub(super) fn device_callbacks(context: *mut c_void) -> ACameraDevice_StateCallbacks {
    ACameraDevice_StateCallbacks {
        context,
        onDisconnected: Some(on_disconnected),
        onError: Some(on_error),
    }
}

// ===== Session state =====

unsafe extern "C" fn on_session_active(context: *mut c_void, _s: *mut ACameraCaptureSession) {
    unsafe { dispatch(context, SessionEvent::Active) }
}

unsafe extern "C" fn on_session_ready(context: *mut c_void, _s: *mut ACameraCaptureSession) {
    unsafe { dispatch(context, SessionEvent::Ready) }
}

unsafe extern "C" fn on_session_closed(context: *mut c_void, _s: *mut ACameraCaptureSession) {
    unsafe { dispatch(context, SessionEvent::Closed) }
}

pub(super) fn session_callbacks(context: *mut c_void) -> ACameraCaptureSession_stateCallbacks {
    ACameraCaptureSession_stateCallbacks {
        context,
        onClosed: Some(on_session_closed),
        onReady: Some(on_session_ready),
        onActive: Some(on_session_active),
    }
}

// ===== Capture =====

unsafe extern "C" fn on_capture_started(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    _request: *const ACaptureRequest,
    timestamp: i64,
) {
    unsafe {
        dispatch(
            context,
            CaptureEvent::Started {
                timestamp_ns: timestamp,
            },
        )
    }
}

unsafe extern "C" fn on_capture_progressed(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    _request: *mut ACaptureRequest,
    _result: *const ACameraMetadata,
) {
    unsafe { dispatch(context, CaptureEvent::Progressed) }
}

unsafe extern "C" fn on_capture_completed(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    _request: *mut ACaptureRequest,
    _result: *const ACameraMetadata,
) {
    unsafe { dispatch(context, CaptureEvent::Completed) }
}

unsafe extern "C" fn on_capture_failed(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    _request: *mut ACaptureRequest,
    failure: *mut ACameraCaptureFailure,
) {
    let (frame_number, reason) = unsafe { failure.as_ref() }
        .map(|f| (f.frameNumber, f.reason))
        .unwrap_or((-1, 0));
    unsafe {
        dispatch(
            context,
            CaptureEvent::Failed {
                frame_number,
                reason,
            },
        )
    }
}

unsafe extern "C" fn on_capture_sequence_completed(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    sequence_id: c_int,
    frame_number: i64,
) {
    unsafe {
        dispatch(
            context,
            CaptureEvent::SequenceCompleted {
                sequence_id,
                frame_number,
            },
        )
    }
}

unsafe extern "C" fn on_capture_sequence_aborted(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    sequence_id: c_int,
) {
    unsafe { dispatch(context, CaptureEvent::SequenceAborted { sequence_id }) }
}

unsafe extern "C" fn on_capture_buffer_lost(
    context: *mut c_void,
    _session: *mut ACameraCaptureSession,
    _request: *mut ACaptureRequest,
    _window: *mut ANativeWindow,
    frame_number: i64,
) {
    unsafe { dispatch(context, CaptureEvent::BufferLost { frame_number }) }
}

pub(super) fn capture_callbacks(context: *mut c_void) -> ACameraCaptureSession_captureCallbacks {
    ACameraCaptureSession_captureCallbacks {
        context,
        onCaptureStarted: Some(on_capture_started),
        onCaptureProgressed: Some(on_capture_progressed),
        onCaptureCompleted: Some(on_capture_completed),
        onCaptureFailed: Some(on_capture_failed),
        onCaptureSequenceCompleted: Some(on_capture_sequence_completed),
        onCaptureSequenceAborted: Some(on_capture_sequence_aborted),
        onCaptureBufferLost: Some(on_capture_buffer_lost),
    }
}
