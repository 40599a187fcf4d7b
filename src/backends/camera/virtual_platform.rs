// SPDX-License-Identifier: GPL-3.0-only

//! In-process camera platform
//!
//! Serves cameras described by a [`CameraSetup`] and records every call so
//! the lifecycle can be inspected. Used by the CLI on hosts without a
//! camera service and by the tests.
//!
//! Events reach the sink on a dedicated delivery thread, never inside the
//! service call that caused them, matching how platform callbacks arrive.

use super::events::{CameraEvent, CameraEventSink, CaptureEvent, SessionEvent};
use super::types::*;
use super::{CameraPlatform, CameraService};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One camera served by the virtual platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualCameraSpec {
    pub id: CameraId,
    /// Omitted for cameras that report no lens facing
    #[serde(default)]
    pub facing: Option<LensFacing>,
    #[serde(default)]
    pub stream_configurations: Vec<StreamConfiguration>,
}

impl VirtualCameraSpec {
    pub fn new(
        id: impl Into<String>,
        facing: Option<LensFacing>,
        stream_configurations: Vec<StreamConfiguration>,
    ) -> Self {
        Self {
            id: CameraId::new(id),
            facing,
            stream_configurations,
        }
    }
}

/// Description of the cameras and failure modes of a virtual platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSetup {
    #[serde(default)]
    pub cameras: Vec<VirtualCameraSpec>,
    /// Make `create_manager` fail
    #[serde(default)]
    pub fail_manager_creation: bool,
    /// Make every `open_device` fail with `CameraInUse`
    #[serde(default)]
    pub fail_open: bool,
    /// Make every `start_repeating` fail after the surface is acquired
    #[serde(default)]
    pub fail_stream_start: bool,
}

impl CameraSetup {
    /// No cameras, no failures
    pub fn empty() -> Self {
        Self {
            cameras: Vec::new(),
            fail_manager_creation: false,
            fail_open: false,
            fail_stream_start: false,
        }
    }

    /// Load a setup from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let setup = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "Loaded camera setup");
        Ok(setup)
    }
}

impl Default for CameraSetup {
    /// Phone-like device: a back camera with the usual YUV/JPEG/RAW sizes
    /// and a front camera
    fn default() -> Self {
        use PixelFormat::*;

        let back = vec![
            StreamConfiguration::output(Yuv420, 4032, 3024),
            StreamConfiguration::output(Yuv420, 1920, 1080),
            StreamConfiguration::output(Yuv420, 1280, 720),
            StreamConfiguration::output(Yuv420, 640, 480),
            StreamConfiguration::output(Jpeg, 4032, 3024),
            StreamConfiguration::output(Jpeg, 1920, 1080),
            StreamConfiguration::output(Raw16, 4032, 3024),
            StreamConfiguration::output(Private, 1920, 1080),
            StreamConfiguration::new(Private, 4032, 3024, StreamDirection::Input),
        ];
        let front = vec![
            StreamConfiguration::output(Yuv420, 2560, 1920),
            StreamConfiguration::output(Yuv420, 1280, 720),
            StreamConfiguration::output(Yuv420, 640, 480),
            StreamConfiguration::output(Jpeg, 2560, 1920),
        ];

        Self {
            cameras: vec![
                VirtualCameraSpec::new("0", Some(LensFacing::Back), back),
                VirtualCameraSpec::new("1", Some(LensFacing::Front), front),
            ],
            ..Self::empty()
        }
    }
}

/// Calls observed by a virtual platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualLog {
    pub managers_created: usize,
    pub managers_released: usize,
    pub opened_devices: Vec<CameraId>,
    pub closed_devices: Vec<CameraId>,
    pub repeating_requests: usize,
    /// Surfaces held by running sessions
    pub surfaces_in_use: Vec<SurfaceHandle>,
    /// Surfaces released by stopped sessions, in order
    pub released_surfaces: Vec<SurfaceHandle>,
}

type SharedLog = Arc<Mutex<VirtualLog>>;

fn lock(log: &SharedLog) -> MutexGuard<'_, VirtualLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Delivery {
    Event(Arc<dyn CameraEventSink>, CameraEvent),
    /// Answered once every event queued before it has been delivered
    Flush(Sender<()>),
}

/// Start the delivery thread. It exits when the last sender is dropped.
fn spawn_delivery_thread() -> Sender<Delivery> {
    let (sender, receiver) = mpsc::channel::<Delivery>();
    std::thread::spawn(move || {
        for delivery in receiver {
            match delivery {
                Delivery::Event(sink, event) => sink.on_event(event),
                Delivery::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    });
    sender
}

/// Platform backed by a [`CameraSetup`]
#[derive(Debug)]
pub struct VirtualCameraPlatform {
    setup: CameraSetup,
    log: SharedLog,
    deliveries: Sender<Delivery>,
}

impl VirtualCameraPlatform {
    pub fn new(setup: CameraSetup) -> Self {
        Self {
            setup,
            log: Arc::new(Mutex::new(VirtualLog::default())),
            deliveries: spawn_delivery_thread(),
        }
    }

    /// Snapshot of the calls made so far
    pub fn log(&self) -> VirtualLog {
        lock(&self.log).clone()
    }

    /// Block until every event emitted so far has reached its sink
    pub fn wait_for_events(&self) {
        let (done, finished) = mpsc::channel();
        if self.deliveries.send(Delivery::Flush(done)).is_ok() {
            let _ = finished.recv();
        }
    }
}

impl Default for VirtualCameraPlatform {
    fn default() -> Self {
        Self::new(CameraSetup::default())
    }
}

impl CameraPlatform for VirtualCameraPlatform {
    fn create_manager(&self) -> BackendResult<Box<dyn CameraService>> {
        if self.setup.fail_manager_creation {
            return Err(BackendError::NotAvailable(
                "virtual camera service disabled".to_string(),
            ));
        }
        lock(&self.log).managers_created += 1;
        info!(cameras = self.setup.cameras.len(), "Virtual camera manager created");
        Ok(Box::new(VirtualCameraService {
            setup: self.setup.clone(),
            log: Arc::clone(&self.log),
            deliveries: self.deliveries.clone(),
            next_handle: 1,
            devices: HashMap::new(),
            sessions: HashMap::new(),
        }))
    }
}

struct VirtualSession {
    surface: SurfaceHandle,
    events: Arc<dyn CameraEventSink>,
}

struct VirtualCameraService {
    setup: CameraSetup,
    log: SharedLog,
    deliveries: Sender<Delivery>,
    next_handle: u64,
    devices: HashMap<DeviceHandle, CameraId>,
    sessions: HashMap<SessionHandle, VirtualSession>,
}

impl VirtualCameraService {
    fn find(&self, id: &CameraId) -> BackendResult<&VirtualCameraSpec> {
        self.setup
            .cameras
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| BackendError::InvalidParameter(format!("unknown camera id '{}'", id)))
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Queue an event for the delivery thread
    fn emit(&self, sink: &Arc<dyn CameraEventSink>, event: impl Into<CameraEvent>) {
        if self
            .deliveries
            .send(Delivery::Event(Arc::clone(sink), event.into()))
            .is_err()
        {
            warn!("Virtual event delivery thread is gone");
        }
    }
}

impl CameraService for VirtualCameraService {
    fn camera_ids(&self) -> BackendResult<Vec<CameraId>> {
        Ok(self.setup.cameras.iter().map(|c| c.id.clone()).collect())
    }

    fn characteristics(&self, id: &CameraId) -> BackendResult<CameraCharacteristics> {
        let spec = self.find(id)?;
        Ok(CameraCharacteristics {
            lens_facing: spec.facing,
            stream_configurations: spec.stream_configurations.clone(),
        })
    }

    fn open_device(
        &mut self,
        id: &CameraId,
        _events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<DeviceHandle> {
        self.find(id)?;
        if self.setup.fail_open || self.devices.values().any(|open| open == id) {
            return Err(BackendError::CameraInUse);
        }

        let handle = DeviceHandle(self.next_handle());
        self.devices.insert(handle, id.clone());
        lock(&self.log).opened_devices.push(id.clone());
        Ok(handle)
    }

    fn close_device(&mut self, device: DeviceHandle) {
        if let Some(id) = self.devices.remove(&device) {
            lock(&self.log).closed_devices.push(id);
        }
    }

    fn start_repeating(
        &mut self,
        device: DeviceHandle,
        surface: &SurfaceHandle,
        template: RequestTemplate,
        events: Arc<dyn CameraEventSink>,
    ) -> BackendResult<SessionHandle> {
        if !self.devices.contains_key(&device) {
            return Err(BackendError::InvalidParameter(format!(
                "unknown device {:?}",
                device
            )));
        }

        lock(&self.log).surfaces_in_use.push(*surface);
        if self.setup.fail_stream_start {
            // Tear down the half-built session
            let mut log = lock(&self.log);
            log.surfaces_in_use.retain(|s| s != surface);
            log.released_surfaces.push(*surface);
            return Err(BackendError::Status(-10001));
        }

        let handle = SessionHandle(self.next_handle());
        lock(&self.log).repeating_requests += 1;
        debug!(?template, session = handle.0, "Virtual repeating request");

        self.emit(&events, SessionEvent::Active);
        self.emit(&events, CaptureEvent::Started { timestamp_ns: 0 });
        self.sessions.insert(
            handle,
            VirtualSession {
                surface: *surface,
                events,
            },
        );
        Ok(handle)
    }

    fn stop_repeating(&mut self, session: SessionHandle) {
        let Some(stopped) = self.sessions.remove(&session) else {
            return;
        };

        {
            let mut log = lock(&self.log);
            log.surfaces_in_use.retain(|s| *s != stopped.surface);
            log.released_surfaces.push(stopped.surface);
        }

        self.emit(
            &stopped.events,
            CaptureEvent::SequenceCompleted {
                sequence_id: i32::try_from(session.0).unwrap_or(i32::MAX),
                frame_number: 0,
            },
        );
        self.emit(&stopped.events, SessionEvent::Closed);
    }
}

impl Drop for VirtualCameraService {
    fn drop(&mut self) {
        lock(&self.log).managers_released += 1;
    }
}
