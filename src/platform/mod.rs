//! Platform surfaces for the overlay.
//!
//! - macOS: `macos::AppKitArbiter`, a non-activating NSPanel, plus the
//!   AppKit event pump the UI queue interleaves with
//! - elsewhere: `console::ConsoleArbiter` driven by stdin; on Windows the
//!   UI queue also pumps Win32 messages so hotkeys are delivered

use crate::dispatch::UiSender;
use crate::error::StackError;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(target_os = "macos"))]
pub mod console;

#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(target_os = "macos")]
pub type PlatformArbiter = macos::AppKitArbiter;

#[cfg(not(target_os = "macos"))]
pub type PlatformArbiter = console::ConsoleArbiter;

/// Process-level setup. Call once on the main thread before anything else
/// touches the window system.
#[cfg(target_os = "macos")]
pub fn init() {
    macos::init_application();
}

#[cfg(not(target_os = "macos"))]
pub fn init() {}

/// Build the overlay surface. Input from the surface is posted to `sender`.
#[cfg(target_os = "macos")]
pub fn create_arbiter(sender: UiSender) -> Result<PlatformArbiter, StackError> {
    macos::AppKitArbiter::new(sender)
}

#[cfg(not(target_os = "macos"))]
pub fn create_arbiter(sender: UiSender) -> Result<PlatformArbiter, StackError> {
    console::spawn_stdin_reader(sender)
        .map_err(|e| StackError::Platform(format!("failed to start stdin reader: {}", e)))?;
    Ok(console::ConsoleArbiter::new())
}

/// Event pump to interleave with the UI queue, if the platform needs one.
#[cfg(target_os = "macos")]
pub fn event_pump() -> Option<fn(std::time::Duration)> {
    Some(macos::pump_events)
}

#[cfg(target_os = "windows")]
pub fn event_pump() -> Option<fn(std::time::Duration)> {
    Some(win32::pump_events)
}

/// X11 hotkeys arrive on global-hotkey's own thread; blocking is fine.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn event_pump() -> Option<fn(std::time::Duration)> {
    None
}
