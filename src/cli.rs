// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing cameras
//! - Printing the selected preview size
//! - Running a preview stream
//!
//! All commands run against the virtual platform.

use simple_camera::backends::camera::{CameraPlatform, CameraSetup, find_back_facing_camera};
use simple_camera::{Camera, LoggingEventSink, SurfaceHandle, VirtualCameraPlatform};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Token for the surface the virtual platform renders into
const VIRTUAL_SURFACE_TOKEN: usize = 1;

/// Load the camera setup, or the built-in phone-like setup when no file is given
pub fn load_setup(path: Option<&Path>) -> Result<CameraSetup, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(CameraSetup::load(path)?),
        None => Ok(CameraSetup::default()),
    }
}

fn open_camera(setup: CameraSetup) -> Result<Camera, Box<dyn std::error::Error>> {
    let camera = Camera::new(
        Arc::new(VirtualCameraPlatform::new(setup)),
        Arc::new(LoggingEventSink),
    );
    camera.open()?;
    Ok(camera)
}

/// List all cameras
pub fn list_cameras(setup: CameraSetup) -> Result<(), Box<dyn std::error::Error>> {
    let platform = VirtualCameraPlatform::new(setup);
    let service = platform.create_manager()?;

    let ids = service.camera_ids()?;
    if ids.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }
    let back = find_back_facing_camera(service.as_ref())?;

    println!("Available cameras:");
    println!();
    for id in &ids {
        let characteristics = service.characteristics(id)?;
        let facing = characteristics
            .lens_facing
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let marker = if back.as_ref() == Some(id) {
            " (preview)"
        } else {
            ""
        };
        println!("  [{}] {}{}", id, facing, marker);

        let outputs: Vec<String> = characteristics
            .output_configurations()
            .map(|c| c.to_string())
            .collect();
        if !outputs.is_empty() {
            println!("      Outputs: {}", outputs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Print the preview size selected for a window
pub fn print_preview_size(
    setup: CameraSetup,
    width: u32,
    height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let camera = open_camera(setup)?;
    let size = camera.preview_size(width, height)?;

    match size.non_zero() {
        Some(size) => println!("{}", size),
        None => println!("none"),
    }

    camera.close();
    Ok(())
}

/// Stream a preview for `duration` seconds or until Ctrl+C
pub fn stream(
    setup: CameraSetup,
    width: u32,
    height: u32,
    duration: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let camera = open_camera(setup)?;
    if let Some(id) = camera.camera_id() {
        println!("Using camera: {}", id);
    }

    let size = camera.preview_size(width, height)?;
    match size.non_zero() {
        Some(size) => println!("Preview size: {}", size),
        None => println!("Preview size: none fits {}x{}", width, height),
    }

    let surface = SurfaceHandle::from_token(VIRTUAL_SURFACE_TOKEN).ok_or("invalid surface token")?;
    camera.start_stream(surface)?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!();
    println!("Streaming... (press Ctrl+C to stop early)");

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rStreaming: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    camera.stop_stream();
    camera.close();
    println!("Stream stopped");
    Ok(())
}
