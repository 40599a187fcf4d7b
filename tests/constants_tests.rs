// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use simple_camera::PixelFormat;
use simple_camera::constants::{STREAM_CONFIGURATION_STRIDE, image_format, lens_facing};

#[test]
fn test_preview_format_codes() {
    // Platform codes for YUV_420_888 and JPEG
    assert_eq!(image_format::YUV_420_888, 0x23);
    assert_eq!(image_format::JPEG, 0x100);
}

#[test]
fn test_known_codes_round_trip_through_pixel_format() {
    for code in [
        image_format::RGBA_8888,
        image_format::RGB_565,
        image_format::RAW16,
        image_format::PRIVATE,
        image_format::YUV_420_888,
        image_format::RAW_PRIVATE,
        image_format::JPEG,
        image_format::DEPTH16,
    ] {
        let format = PixelFormat::from_code(code);
        assert!(
            !matches!(format, PixelFormat::Other(_)),
            "Code 0x{:x} should map to a named format",
            code
        );
        assert_eq!(format.code(), code);
    }
}

#[test]
fn test_lens_facing_back_code() {
    assert_eq!(lens_facing::BACK, 1);
    assert_ne!(lens_facing::FRONT, lens_facing::BACK);
}

#[test]
fn test_stream_configuration_stride() {
    // format, width, height, is_input
    assert_eq!(STREAM_CONFIGURATION_STRIDE, 4);
}
