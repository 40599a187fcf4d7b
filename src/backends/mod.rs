// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! # Modules
//!
//! - [`camera`]: platform traits, the [`camera::Camera`] wrapper, preview
//!   size selection and the virtual / NDK platforms

pub mod camera;
