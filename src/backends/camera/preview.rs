// SPDX-License-Identifier: GPL-3.0-only

//! Preview size selection
//!
//! Picks the advertised output size nearest to the display window among
//! those that fit inside it.

use super::types::{Dimensions, StreamConfiguration};
use tracing::info;

/// Select the preview size for a window of `window_width` x `window_height`.
///
/// Both the window and each candidate are compared in landscape-major form,
/// so the window orientation does not matter. A candidate qualifies when it
/// is an output stream in YUV_420_888 or JPEG and its advertised width and
/// height both fit inside the normalized window. Among qualifying
/// candidates the one with the smallest Euclidean distance to the window
/// wins; on a tie the earlier entry is kept.
///
/// Returns [`Dimensions::ZERO`] when nothing qualifies.
pub fn select_preview_size(
    window_width: u32,
    window_height: u32,
    configurations: &[StreamConfiguration],
) -> Dimensions {
    info!(
        width = window_width,
        height = window_height,
        "Selecting preview size for window"
    );
    let window = Dimensions::new(window_width, window_height).normalized();

    let mut min_distance = f64::INFINITY;
    let mut best = Dimensions::ZERO;

    for config in configurations {
        if !config.is_output()
            || !config.format.is_preview_candidate()
            || config.width > window.width
            || config.height > window.height
        {
            continue;
        }

        let candidate = Dimensions::new(config.width, config.height).normalized();
        let distance = distance(window, candidate);
        if distance < min_distance {
            min_distance = distance;
            best = candidate;
        }
    }

    info!(
        width = best.width,
        height = best.height,
        "Selected preview size"
    );
    best
}

fn distance(a: Dimensions, b: Dimensions) -> f64 {
    let dw = a.width as f64 - b.width as f64;
    let dh = a.height as f64 - b.height as f64;
    (dw * dw + dh * dh).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{PixelFormat, StreamDirection};

    fn yuv(width: u32, height: u32) -> StreamConfiguration {
        StreamConfiguration::output(PixelFormat::Yuv420, width, height)
    }

    fn jpeg(width: u32, height: u32) -> StreamConfiguration {
        StreamConfiguration::output(PixelFormat::Jpeg, width, height)
    }

    #[test]
    fn test_empty_list_yields_zero() {
        assert_eq!(select_preview_size(1920, 1080, &[]), Dimensions::ZERO);
    }

    #[test]
    fn test_portrait_window_exact_match() {
        let configs = [yuv(1920, 1080), yuv(640, 480), jpeg(3000, 2000)];
        assert_eq!(
            select_preview_size(1080, 1920, &configs),
            Dimensions::new(1920, 1080)
        );
    }

    #[test]
    fn test_nearest_by_distance() {
        // 640x480 is 200 away, 720x480 is ~144.2 away
        let configs = [yuv(640, 480), yuv(720, 480)];
        assert_eq!(
            select_preview_size(800, 600, &configs),
            Dimensions::new(720, 480)
        );
    }

    #[test]
    fn test_oversized_candidate_excluded() {
        // 1281x720 has the same aspect ratio as the window but is too wide
        let configs = [yuv(1281, 720), yuv(640, 360)];
        assert_eq!(
            select_preview_size(1280, 720, &configs),
            Dimensions::new(640, 360)
        );
    }

    #[test]
    fn test_tie_keeps_first_entry() {
        // Both are exactly 100 away from 1000x800
        let configs = [jpeg(900, 800), yuv(1000, 700)];
        assert_eq!(
            select_preview_size(1000, 800, &configs),
            Dimensions::new(900, 800)
        );
    }

    #[test]
    fn test_input_and_unsupported_formats_ignored() {
        let configs = [
            StreamConfiguration::new(PixelFormat::Yuv420, 1280, 720, StreamDirection::Input),
            StreamConfiguration::output(PixelFormat::Private, 1280, 720),
            StreamConfiguration::output(PixelFormat::Raw16, 1280, 720),
        ];
        assert_eq!(select_preview_size(1280, 720, &configs), Dimensions::ZERO);
    }

    #[test]
    fn test_portrait_candidate_must_fit_before_normalizing() {
        // 480x640 is checked as advertised: 640 > 600 rejects it
        let configs = [yuv(480, 640), yuv(320, 240)];
        assert_eq!(
            select_preview_size(800, 600, &configs),
            Dimensions::new(320, 240)
        );
    }

    #[test]
    fn test_orientation_of_request_does_not_matter() {
        let configs = [yuv(1280, 720), jpeg(1600, 1200), yuv(640, 480)];
        assert_eq!(
            select_preview_size(1200, 1700, &configs),
            select_preview_size(1700, 1200, &configs)
        );
    }
}
