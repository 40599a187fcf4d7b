// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{STREAM_CONFIGURATION_STRIDE, image_format, lens_facing};
use serde::{Deserialize, Serialize};
use std::ffi::c_void;

/// Opaque camera identifier assigned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Direction in which the lens points relative to the device screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    Front,
    Back,
    External,
}

impl LensFacing {
    /// Map the platform's lens facing byte. Unknown values yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            lens_facing::FRONT => Some(LensFacing::Front),
            lens_facing::BACK => Some(LensFacing::Back),
            lens_facing::EXTERNAL => Some(LensFacing::External),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            LensFacing::Front => lens_facing::FRONT,
            LensFacing::Back => lens_facing::BACK,
            LensFacing::External => lens_facing::EXTERNAL,
        }
    }
}

impl std::fmt::Display for LensFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensFacing::Front => write!(f, "front"),
            LensFacing::Back => write!(f, "back"),
            LensFacing::External => write!(f, "external"),
        }
    }
}

/// Pixel format of a stream configuration
///
/// Only `Yuv420` and `Jpeg` are eligible for preview selection; the other
/// named variants exist so listings stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FormatRepr", into = "FormatRepr")]
pub enum PixelFormat {
    /// YUV_420_888 - flexible 4:2:0
    Yuv420,
    /// JPEG - compressed image
    Jpeg,
    Rgba8888,
    Rgb565,
    Raw16,
    RawPrivate,
    /// Implementation-defined opaque format
    Private,
    Depth16,
    /// Any code not listed above
    Other(i32),
}

impl PixelFormat {
    pub fn from_code(code: i32) -> Self {
        match code {
            image_format::YUV_420_888 => Self::Yuv420,
            image_format::JPEG => Self::Jpeg,
            image_format::RGBA_8888 => Self::Rgba8888,
            image_format::RGB_565 => Self::Rgb565,
            image_format::RAW16 => Self::Raw16,
            image_format::RAW_PRIVATE => Self::RawPrivate,
            image_format::PRIVATE => Self::Private,
            image_format::DEPTH16 => Self::Depth16,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Yuv420 => image_format::YUV_420_888,
            Self::Jpeg => image_format::JPEG,
            Self::Rgba8888 => image_format::RGBA_8888,
            Self::Rgb565 => image_format::RGB_565,
            Self::Raw16 => image_format::RAW16,
            Self::RawPrivate => image_format::RAW_PRIVATE,
            Self::Private => image_format::PRIVATE,
            Self::Depth16 => image_format::DEPTH16,
            Self::Other(code) => *code,
        }
    }

    /// Formats accepted as preview candidates
    pub fn is_preview_candidate(&self) -> bool {
        matches!(self, Self::Yuv420 | Self::Jpeg)
    }

    /// Parse a format name as used in setup files ("YUV_420_888", "JPEG", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "YUV_420_888" | "YUV420" | "YUV" => Some(Self::Yuv420),
            "JPEG" | "JPG" => Some(Self::Jpeg),
            "RGBA_8888" | "RGBA" => Some(Self::Rgba8888),
            "RGB_565" => Some(Self::Rgb565),
            "RAW16" => Some(Self::Raw16),
            "RAW_PRIVATE" => Some(Self::RawPrivate),
            "PRIVATE" => Some(Self::Private),
            "DEPTH16" => Some(Self::Depth16),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Yuv420 => "YUV_420_888".to_string(),
            Self::Jpeg => "JPEG".to_string(),
            Self::Rgba8888 => "RGBA_8888".to_string(),
            Self::Rgb565 => "RGB_565".to_string(),
            Self::Raw16 => "RAW16".to_string(),
            Self::RawPrivate => "RAW_PRIVATE".to_string(),
            Self::Private => "PRIVATE".to_string(),
            Self::Depth16 => "DEPTH16".to_string(),
            Self::Other(code) => format!("0x{:x}", code),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Setup files may spell a format by name or by numeric code
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FormatRepr {
    Name(String),
    Code(i32),
}

impl TryFrom<FormatRepr> for PixelFormat {
    type Error = String;

    fn try_from(repr: FormatRepr) -> Result<Self, Self::Error> {
        match repr {
            FormatRepr::Code(code) => Ok(PixelFormat::from_code(code)),
            FormatRepr::Name(name) => PixelFormat::from_name(&name)
                .or_else(|| parse_hex_code(&name).map(PixelFormat::from_code))
                .ok_or_else(|| format!("unknown pixel format '{}'", name)),
        }
    }
}

impl From<PixelFormat> for FormatRepr {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Other(code) => FormatRepr::Code(code),
            named => FormatRepr::Name(named.name()),
        }
    }
}

fn parse_hex_code(text: &str) -> Option<i32> {
    let digits = text.trim().strip_prefix("0x")?;
    i32::from_str_radix(digits, 16).ok()
}

/// Whether a stream configuration feeds frames into the camera (reprocessing)
/// or out of it (capture)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    #[default]
    Output,
    Input,
}

impl StreamDirection {
    /// The platform encodes direction as an `is_input` flag
    pub fn from_input_flag(flag: i32) -> Self {
        if flag != 0 {
            StreamDirection::Input
        } else {
            StreamDirection::Output
        }
    }

    pub fn input_flag(&self) -> i32 {
        match self {
            StreamDirection::Output => 0,
            StreamDirection::Input => 1,
        }
    }
}

/// One advertised (format, size, direction) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamConfiguration {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub direction: StreamDirection,
}

impl StreamConfiguration {
    pub fn new(format: PixelFormat, width: u32, height: u32, direction: StreamDirection) -> Self {
        Self {
            format,
            width,
            height,
            direction,
        }
    }

    /// Shorthand for an output stream
    pub fn output(format: PixelFormat, width: u32, height: u32) -> Self {
        Self::new(format, width, height, StreamDirection::Output)
    }

    pub fn is_output(&self) -> bool {
        self.direction == StreamDirection::Output
    }

    /// Parse the flat `[format, width, height, is_input, ...]` array published
    /// in camera characteristics. A trailing partial group is ignored, as are
    /// entries with negative dimensions.
    pub fn parse_flat(entries: &[i32]) -> Vec<Self> {
        entries
            .chunks_exact(STREAM_CONFIGURATION_STRIDE)
            .filter_map(|chunk| {
                let width = u32::try_from(chunk[1]).ok()?;
                let height = u32::try_from(chunk[2]).ok()?;
                Some(Self::new(
                    PixelFormat::from_code(chunk[0]),
                    width,
                    height,
                    StreamDirection::from_input_flag(chunk[3]),
                ))
            })
            .collect()
    }

    /// Inverse of [`StreamConfiguration::parse_flat`]. Entries whose
    /// dimensions do not fit in an `i32` are skipped.
    pub fn to_flat(configurations: &[Self]) -> Vec<i32> {
        configurations
            .iter()
            .filter_map(|c| {
                Some([
                    c.format.code(),
                    i32::try_from(c.width).ok()?,
                    i32::try_from(c.height).ok()?,
                    c.direction.input_flag(),
                ])
            })
            .flatten()
            .collect()
    }
}

impl std::fmt::Display for StreamConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.format, self.width, self.height)?;
        if self.direction == StreamDirection::Input {
            write!(f, " (input)")?;
        }
        Ok(())
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// "No match" sentinel returned by preview selection
    pub const ZERO: Dimensions = Dimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Landscape-major form: the larger side becomes the width
    pub fn normalized(self) -> Self {
        if self.width < self.height {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// `None` for the zero sentinel
    pub fn non_zero(self) -> Option<Self> {
        if self.is_zero() { None } else { Some(self) }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Static properties of one camera
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraCharacteristics {
    /// `None` when the camera reports no lens facing entry
    pub lens_facing: Option<LensFacing>,
    pub stream_configurations: Vec<StreamConfiguration>,
}

impl CameraCharacteristics {
    pub fn is_back_facing(&self) -> bool {
        self.lens_facing == Some(LensFacing::Back)
    }

    /// Output configurations only, in advertised order
    pub fn output_configurations(&self) -> impl Iterator<Item = &StreamConfiguration> {
        self.stream_configurations.iter().filter(|c| c.is_output())
    }
}

/// Capture request template. Only preview requests are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestTemplate {
    #[default]
    Preview,
}

/// Platform display surface (a native window on Android)
///
/// Stored as an address so the handle can cross threads; the platform
/// owns the surface itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(usize);

impl SurfaceHandle {
    /// Wrap a raw native window pointer; `None` for null
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr as usize))
        }
    }

    /// Surface identified by a plain token (virtual platform)
    pub fn from_token(token: usize) -> Option<Self> {
        if token == 0 { None } else { Some(Self(token)) }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn token(&self) -> usize {
        self.0
    }
}

/// Handle to an opened device, issued by a [`super::CameraService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// Handle to a running capture session, issued by a [`super::CameraService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Camera service not reachable on this system
    NotAvailable(String),
    /// The service rejected an argument (unknown id, null surface, ...)
    InvalidParameter(String),
    /// Missing camera permission
    PermissionDenied,
    /// Device held by another client
    CameraInUse,
    /// Device went away
    Disconnected,
    /// Unmapped platform status code
    Status(i32),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Camera service not available: {}", msg),
            BackendError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            BackendError::PermissionDenied => write!(f, "Camera permission denied"),
            BackendError::CameraInUse => write!(f, "Camera is in use"),
            BackendError::Disconnected => write!(f, "Camera disconnected"),
            BackendError::Status(code) => write!(f, "Camera status {}", code),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
