//! Input monitoring permission.
//!
//! On macOS a global hotkey that works while other apps are focused needs the
//! Accessibility permission (System Settings > Privacy & Security >
//! Accessibility). Other platforms have no such gate.

#[cfg(target_os = "macos")]
use anyhow::Context;
use tracing::warn;
#[cfg(target_os = "macos")]
use tracing::{debug, info, instrument};

// ============================================================================
// Probe
// ============================================================================

/// Whether the process may intercept keys system-wide.
///
/// Never shows a prompt.
#[cfg(target_os = "macos")]
#[instrument]
pub fn input_monitoring_granted() -> bool {
    let granted = macos_accessibility_client::accessibility::application_is_trusted();
    debug!(granted, "Checked accessibility permission");
    granted
}

#[cfg(not(target_os = "macos"))]
pub fn input_monitoring_granted() -> bool {
    true
}

// ============================================================================
// Prompt
// ============================================================================

/// Asks the user to grant input monitoring permission.
pub trait PermissionPrompt {
    fn request(&self);
}

/// Shows the system prompt and opens the Accessibility pane.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissionPrompt;

#[cfg(target_os = "macos")]
impl PermissionPrompt for SystemPermissionPrompt {
    #[instrument(skip(self))]
    fn request(&self) {
        info!("Requesting accessibility permission");
        if macos_accessibility_client::accessibility::application_is_trusted_with_prompt() {
            info!("Accessibility permission granted");
            return;
        }
        warn!("Accessibility permission denied or pending");
        if let Err(e) = open_accessibility_settings() {
            warn!(error = ?e, "Could not open System Settings");
        }
    }
}

#[cfg(not(target_os = "macos"))]
impl PermissionPrompt for SystemPermissionPrompt {
    fn request(&self) {
        warn!(
            "Global hotkey permission is unavailable. Check that the desktop session \
             allows global key grabs (X11) and restart stack"
        );
    }
}

/// Open System Settings directly at the Accessibility pane.
#[cfg(target_os = "macos")]
pub fn open_accessibility_settings() -> anyhow::Result<()> {
    info!("Opening accessibility settings");
    std::process::Command::new("open")
        .arg("x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility")
        .spawn()
        .context("Failed to open System Settings")?;
    Ok(())
}
