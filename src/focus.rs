//! Window-level focus hand-offs for the overlay surface.
//!
//! The arbiter raises the overlay and routes keystrokes into it without the
//! owning process becoming the active application. Dismissal only removes
//! the surface; the window manager restores focus to whatever had it.

/// Opaque id of an overlay surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u32);

/// Opaque id of an input field on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub u32);

/// The single overlay surface and its single field
pub const OVERLAY_SURFACE: SurfaceHandle = SurfaceHandle(1);
pub const OVERLAY_FIELD: FieldHandle = FieldHandle(1);

/// Outcome of a keyboard focus claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusClaim {
    Granted,
    Denied,
}

pub trait FocusArbiter {
    /// Raise `surface` above every window on every space, without activating
    /// the owning process.
    fn present_above_all(&mut self, surface: SurfaceHandle);

    /// Make `field` the keyboard focus target.
    fn claim_keyboard_focus(&mut self, surface: SurfaceHandle, field: FieldHandle) -> FocusClaim;

    /// Remove `surface` from the window stack. Must not activate any other
    /// application.
    fn dismiss(&mut self, surface: SurfaceHandle);
}
