// SPDX-License-Identifier: GPL-3.0-only

fn main() {
    println!("cargo::rerun-if-changed=build.rs");

    // The NDK camera API lives in libcamera2ndk; ANativeWindow in libandroid
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "android" {
        println!("cargo::rustc-link-lib=camera2ndk");
        println!("cargo::rustc-link-lib=mediandk");
        println!("cargo::rustc-link-lib=android");
    }
}
