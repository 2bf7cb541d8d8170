//! Touch gesture daemon for the reMarkable 2.
//!
//! This library tracks multi-touch contacts from the kernel's evdev interface
//! and launches shell commands when configured finger taps are detected.

use std::fmt::Display;

use tracing::error;

pub mod config;
pub mod daemon;
pub mod detector;
pub mod evdev;
pub mod gesture;
pub mod input;

/// Log an error, ignoring success.
pub fn trace_error<T, E: Display>(result: Result<T, E>) {
    if let Err(err) = &result {
        error!("{err}");
    }
}
