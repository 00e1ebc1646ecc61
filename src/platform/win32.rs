//! Win32 message pump.
//!
//! The hotkey manager registers through a hidden window owned by the thread
//! that created it, so `WM_HOTKEY` is only delivered while that thread keeps
//! dispatching messages.

use std::thread;
use std::time::Duration;

use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
};

/// Dispatch every pending message for this thread, then sleep out `timeout`.
pub fn pump_events(timeout: Duration) {
    let mut msg = MSG::default();
    let mut dispatched = false;
    unsafe {
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
            dispatched = true;
        }
    }
    if !dispatched {
        thread::sleep(timeout);
    }
}
