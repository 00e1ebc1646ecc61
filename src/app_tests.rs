//! CaptureApp tests: permission transitions and UI loop wiring.

use super::*;
use crate::dispatch::ui_queue;
use crate::focus::{FieldHandle, FocusClaim, SurfaceHandle};
use crate::hotkeys::HotkeyBackend;
use crate::overlay::{FocusRetryPolicy, OverlayState};
use parking_lot::Mutex;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct OsState {
    permission: bool,
    refuse: bool,
    callback: Option<MatchCallback>,
}

#[derive(Clone, Default)]
struct FakeOs {
    state: Arc<Mutex<OsState>>,
}

impl FakeOs {
    fn set_permission(&self, granted: bool) {
        self.state.lock().permission = granted;
    }

    fn press(&self) {
        let callback = self.state.lock().callback.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn is_installed(&self) -> bool {
        self.state.lock().callback.is_some()
    }
}

impl HotkeyBackend for FakeOs {
    fn permission_granted(&self) -> bool {
        self.state.lock().permission
    }

    fn install(&mut self, _binding: &HotkeyBinding, on_match: MatchCallback) -> Result<u32, HotkeyError> {
        let mut state = self.state.lock();
        if state.refuse {
            return Err(HotkeyError::Os("reserved by system".to_string()));
        }
        state.callback = Some(on_match);
        Ok(7)
    }

    fn uninstall(&mut self, _id: u32) -> Result<(), HotkeyError> {
        self.state.lock().callback = None;
        Ok(())
    }
}

#[derive(Default)]
struct NullArbiter;

impl FocusArbiter for NullArbiter {
    fn present_above_all(&mut self, _surface: SurfaceHandle) {}

    fn claim_keyboard_focus(&mut self, _surface: SurfaceHandle, _field: FieldHandle) -> FocusClaim {
        FocusClaim::Granted
    }

    fn dismiss(&mut self, _surface: SurfaceHandle) {}
}

#[derive(Clone, Default)]
struct SharedSink {
    commits: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink for SharedSink {
    fn commit(&self, raw_text: String) {
        self.commits.lock().push(raw_text);
    }
}

#[derive(Clone, Default)]
struct CountingPrompt {
    requests: Rc<Cell<usize>>,
}

impl PermissionPrompt for CountingPrompt {
    fn request(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

struct Harness {
    app: CaptureApp<NullArbiter, SharedSink, CountingPrompt>,
    queue: UiQueue,
    os: FakeOs,
    sink: SharedSink,
    prompt: CountingPrompt,
}

fn harness(permission: bool) -> Harness {
    let os = FakeOs::default();
    os.set_permission(permission);
    let (sender, queue) = ui_queue();
    let sink = SharedSink::default();
    let prompt = CountingPrompt::default();
    let controller = OverlayController::new(
        NullArbiter,
        sink.clone(),
        sender.clone(),
        FocusRetryPolicy::default(),
    );
    let app = CaptureApp::new(
        HotkeyRegistry::new(Box::new(os.clone())),
        controller,
        prompt.clone(),
        sender,
        HotkeyBinding::default(),
    );
    Harness {
        app,
        queue,
        os,
        sink,
        prompt,
    }
}

impl Harness {
    /// Deliver everything currently queued
    fn pump(&mut self) {
        for event in self.queue.drain() {
            self.app.handle(event);
        }
    }
}

#[test]
fn start_with_permission_registers_hotkey() {
    let mut h = harness(true);
    h.app.start();

    assert_eq!(h.app.status(), &HotkeyStatus::Active);
    assert!(h.os.is_installed());
    assert_eq!(h.prompt.requests.get(), 0);
}

#[test]
fn hotkey_press_is_posted_then_shows_overlay() {
    let mut h = harness(true);
    h.app.start();

    h.os.press();
    // Nothing happens until the UI thread drains the queue
    assert_eq!(h.app.controller().state(), OverlayState::Hidden);

    h.pump();
    assert!(h.app.controller().is_visible());
    assert_eq!(h.app.controller().buffer_text(), Some(""));
}

#[test]
fn typed_text_is_committed_on_submit() {
    let mut h = harness(true);
    h.app.start();
    h.os.press();
    h.pump();

    h.app.handle(UiEvent::Overlay(OverlayEvent::TextChanged("buy milk".into())));
    h.app.handle(UiEvent::Overlay(OverlayEvent::Submit));

    assert_eq!(*h.sink.commits.lock(), vec!["buy milk".to_string()]);
    assert!(!h.app.controller().is_visible());
}

#[test]
fn denied_permission_prompts_once_per_episode() {
    let mut h = harness(false);
    h.app.start();
    assert_eq!(h.app.status(), &HotkeyStatus::PermissionDenied);
    assert_eq!(h.prompt.requests.get(), 1);

    h.app.handle(UiEvent::PermissionRecheck);
    h.app.handle(UiEvent::PermissionRecheck);
    assert_eq!(h.prompt.requests.get(), 1);

    // Key presses go nowhere while denied
    h.os.press();
    assert!(h.queue.drain().is_empty());
}

#[test]
fn granting_permission_later_registers_without_restart() {
    let mut h = harness(false);
    h.app.start();

    h.os.set_permission(true);
    h.app.handle(UiEvent::PermissionRecheck);

    assert_eq!(h.app.status(), &HotkeyStatus::Active);
    h.os.press();
    h.pump();
    assert!(h.app.controller().is_visible());
}

#[test]
fn revoking_permission_unregisters() {
    let mut h = harness(true);
    h.app.start();

    h.os.set_permission(false);
    h.app.handle(UiEvent::PermissionRecheck);

    assert_eq!(h.app.status(), &HotkeyStatus::PermissionDenied);
    assert!(!h.os.is_installed());
    assert_eq!(h.prompt.requests.get(), 1);

    // Regranting starts a fresh episode
    h.os.set_permission(true);
    h.app.handle(UiEvent::PermissionRecheck);
    h.os.set_permission(false);
    h.app.handle(UiEvent::PermissionRecheck);
    assert_eq!(h.prompt.requests.get(), 2);
}

#[test]
fn os_refusal_marks_hotkey_unavailable() {
    let mut h = harness(true);
    h.os.state.lock().refuse = true;
    h.app.start();

    assert!(matches!(h.app.status(), HotkeyStatus::Unavailable(msg) if msg.contains("reserved")));
    // Periodic checks do not hammer the OS with the same refused binding
    h.os.state.lock().refuse = false;
    h.app.handle(UiEvent::PermissionRecheck);
    assert!(matches!(h.app.status(), HotkeyStatus::Unavailable(_)));
}

#[test]
fn run_processes_until_quit_and_releases_hotkey() {
    let mut h = harness(true);
    h.app.start();

    h.os.press();
    let events = [
        UiEvent::Overlay(OverlayEvent::TextChanged("ship it: work".into())),
        UiEvent::Overlay(OverlayEvent::Submit),
        UiEvent::Overlay(OverlayEvent::HotkeyPressed),
        UiEvent::Quit,
    ];
    for event in events {
        h.app.sender.post(event);
    }

    h.app.run(&h.queue, None);

    assert_eq!(*h.sink.commits.lock(), vec!["ship it: work".to_string()]);
    assert!(!h.app.controller().is_visible());
    assert!(!h.os.is_installed());
    assert_eq!(h.app.status(), &HotkeyStatus::Inactive);
}

#[test]
fn run_with_pump_interleaves_platform_events() {
    let mut h = harness(true);
    h.app.start();
    h.app.sender.post(UiEvent::Quit);

    fn no_op_pump(_timeout: Duration) {}
    h.app.run(&h.queue, Some(no_op_pump));
    assert!(!h.os.is_installed());
}

#[test]
fn run_stops_at_quit_and_leaves_later_events_queued() {
    let mut h = harness(true);
    h.app.start();
    h.app.sender.post(UiEvent::Overlay(OverlayEvent::HotkeyPressed));
    h.app.sender.post(UiEvent::Quit);
    h.app.sender.post(UiEvent::Overlay(OverlayEvent::HotkeyPressed));

    h.app.run(&h.queue, None);

    // The overlay shown before Quit is cancelled on shutdown
    assert!(!h.app.controller().is_visible());
    assert_eq!(h.queue.drain().len(), 1);
}
