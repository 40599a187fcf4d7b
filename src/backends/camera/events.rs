// SPDX-License-Identifier: GPL-3.0-only

//! Device, session and capture callbacks
//!
//! The platform reports lifecycle changes through callbacks on its own
//! threads. They are delivered here as [`CameraEvent`] values to a
//! [`CameraEventSink`]. Nothing in the wrapper reacts to them; the default
//! sink only logs.

use tracing::{debug, trace, warn};

/// Device state callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Disconnected,
    /// Platform error code (`ERROR_CAMERA_DEVICE`, `ERROR_CAMERA_SERVICE`, ...)
    Error(i32),
}

/// Capture session state callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Active,
    Ready,
    Closed,
}

/// Per-request capture callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Started { timestamp_ns: i64 },
    Progressed,
    Completed,
    Failed { frame_number: i64, reason: i32 },
    SequenceCompleted { sequence_id: i32, frame_number: i64 },
    SequenceAborted { sequence_id: i32 },
    BufferLost { frame_number: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    Device(DeviceEvent),
    Session(SessionEvent),
    Capture(CaptureEvent),
}

impl From<DeviceEvent> for CameraEvent {
    fn from(event: DeviceEvent) -> Self {
        CameraEvent::Device(event)
    }
}

impl From<SessionEvent> for CameraEvent {
    fn from(event: SessionEvent) -> Self {
        CameraEvent::Session(event)
    }
}

impl From<CaptureEvent> for CameraEvent {
    fn from(event: CaptureEvent) -> Self {
        CameraEvent::Capture(event)
    }
}

/// Receiver for platform callbacks
///
/// Called from platform threads, so implementations must not block.
pub trait CameraEventSink: Send + Sync {
    fn on_event(&self, event: CameraEvent);
}

/// Default sink: logs every event and otherwise ignores it
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

impl CameraEventSink for LoggingEventSink {
    fn on_event(&self, event: CameraEvent) {
        match event {
            CameraEvent::Device(DeviceEvent::Error(code)) => {
                warn!(code, "Camera device error (unhandled)");
            }
            CameraEvent::Device(DeviceEvent::Disconnected) => {
                warn!("Camera device disconnected (unhandled)");
            }
            CameraEvent::Session(state) => debug!(?state, "Capture session state"),
            CameraEvent::Capture(capture) => trace!(?capture, "Capture callback"),
        }
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl CameraEventSink for NoopEventSink {
    fn on_event(&self, _event: CameraEvent) {}
}
