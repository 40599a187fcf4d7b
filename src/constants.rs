// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Numeric codes mirror the values published by the platform camera
//! metadata (`AIMAGE_FORMAT_*`, `ACAMERA_LENS_FACING_*`).

/// Image format codes reported in stream configuration entries
pub mod image_format {
    pub const RGBA_8888: i32 = 0x1;
    pub const RGB_565: i32 = 0x4;
    pub const RAW16: i32 = 0x20;
    pub const PRIVATE: i32 = 0x22;
    /// Flexible YUV 4:2:0, the usual preview format
    pub const YUV_420_888: i32 = 0x23;
    pub const RAW_PRIVATE: i32 = 0x24;
    /// Compressed still image
    pub const JPEG: i32 = 0x100;
    pub const DEPTH16: i32 = 0x4436_3159;
}

/// Lens facing codes from camera characteristics
pub mod lens_facing {
    pub const FRONT: u8 = 0;
    pub const BACK: u8 = 1;
    pub const EXTERNAL: u8 = 2;
}

/// Number of `i32` values per entry in the flat stream configuration array
/// (format, width, height, is_input)
pub const STREAM_CONFIGURATION_STRIDE: usize = 4;

/// Window size used by the CLI when none is given (portrait phone screen)
pub const DEFAULT_WINDOW_WIDTH: u32 = 1080;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1920;

/// Default stream duration for the `stream` command, in seconds
pub const DEFAULT_STREAM_SECONDS: u64 = 5;

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "simple-camera";

/// Application config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";
