//! Startup wiring and the UI loop.
//!
//! `CaptureApp` owns the hotkey registry and the overlay controller, keeps
//! the registration in step with the input monitoring permission, and feeds
//! UI queue events to the controller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::capture::CaptureSink;
use crate::dispatch::{UiEvent, UiQueue, UiSender};
use crate::error::{HotkeyError, StackError};
use crate::focus::FocusArbiter;
use crate::hotkeys::{HotkeyBinding, HotkeyHandle, HotkeyRegistry, MatchCallback};
use crate::overlay::{OverlayController, OverlayEvent};
use crate::permissions::PermissionPrompt;

/// Whether the overlay can currently be reached by hotkey
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyStatus {
    /// Not attempted yet
    Inactive,
    Active,
    /// Waiting for the user to grant permission; re-checked periodically
    PermissionDenied,
    /// The OS refused the binding
    Unavailable(String),
}

pub struct CaptureApp<A, S, P> {
    registry: HotkeyRegistry,
    controller: OverlayController<A, S, UiSender>,
    prompt: P,
    sender: UiSender,
    binding: HotkeyBinding,
    handle: Option<HotkeyHandle>,
    status: HotkeyStatus,
    /// Set once the prompt has been shown for the current denial
    prompted: bool,
}

impl<A, S, P> CaptureApp<A, S, P>
where
    A: FocusArbiter,
    S: CaptureSink,
    P: PermissionPrompt,
{
    pub fn new(
        registry: HotkeyRegistry,
        controller: OverlayController<A, S, UiSender>,
        prompt: P,
        sender: UiSender,
        binding: HotkeyBinding,
    ) -> Self {
        Self {
            registry,
            controller,
            prompt,
            sender,
            binding,
            handle: None,
            status: HotkeyStatus::Inactive,
            prompted: false,
        }
    }

    /// Check permission and register the hotkey, prompting if needed.
    pub fn start(&mut self) {
        info!(binding = %self.binding.display(), "Starting capture");
        self.refresh_permission();
    }

    /// Start periodic permission re-checks on the UI queue.
    pub fn schedule_permission_checks(&self, interval: Duration) -> Result<(), StackError> {
        self.sender
            .post_every(interval, UiEvent::PermissionRecheck)
            .map_err(|e| StackError::Platform(format!("failed to start permission timer: {}", e)))
    }

    /// Bring the registration in line with the current permission.
    pub fn refresh_permission(&mut self) {
        let granted = self.registry.check_permission();
        match (granted, self.handle) {
            (true, None) => {
                if !matches!(self.status, HotkeyStatus::Unavailable(_)) {
                    self.register();
                }
            }
            (false, Some(handle)) => {
                warn!(binding = %self.binding.display(), "Permission revoked, unregistering hotkey");
                self.registry.unregister(handle);
                self.handle = None;
                self.enter_permission_denied();
            }
            (false, None) => {
                if self.status != HotkeyStatus::PermissionDenied {
                    self.enter_permission_denied();
                }
            }
            (true, Some(_)) => {}
        }
    }

    fn register(&mut self) {
        let sender = self.sender.clone();
        let on_match: MatchCallback = Arc::new(move || {
            sender.post_overlay(OverlayEvent::HotkeyPressed);
        });

        match self.registry.register(self.binding, on_match) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.status = HotkeyStatus::Active;
                self.prompted = false;
                info!(binding = %self.binding.display(), "Capture hotkey active");
            }
            Err(HotkeyError::PermissionDenied) => self.enter_permission_denied(),
            Err(e) => {
                let err = StackError::from(e);
                error!(error = %err, severity = ?err.severity(), "{}", err.user_message());
                self.status = HotkeyStatus::Unavailable(err.to_string());
            }
        }
    }

    fn enter_permission_denied(&mut self) {
        self.status = HotkeyStatus::PermissionDenied;
        if self.prompted {
            return;
        }
        let err = StackError::from(HotkeyError::PermissionDenied);
        warn!(severity = ?err.severity(), "{}", err.user_message());
        self.prompt.request();
        self.prompted = true;
    }

    /// Handle one UI event. Returns false when the loop should stop.
    pub fn handle(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Overlay(event) => {
                self.controller.handle(event);
                true
            }
            UiEvent::PermissionRecheck => {
                self.refresh_permission();
                true
            }
            UiEvent::Quit => false,
        }
    }

    /// Process the UI queue until `Quit` or until every sender is gone.
    pub fn run(&mut self, queue: &UiQueue, pump: Option<fn(Duration)>) {
        loop {
            let event = match pump {
                Some(mut pump) => queue.next(Some(&mut pump)),
                None => queue.next(None),
            };
            match event {
                Some(event) => {
                    if !self.handle(event) {
                        break;
                    }
                }
                None => break,
            }
        }
        self.shutdown();
    }

    /// Hide the overlay and release the hotkey.
    pub fn shutdown(&mut self) {
        if self.controller.is_visible() {
            self.controller.handle(OverlayEvent::Cancel);
        }
        if let Some(handle) = self.handle.take() {
            self.registry.unregister(handle);
        }
        self.status = HotkeyStatus::Inactive;
        info!("Capture stopped");
    }

    pub fn status(&self) -> &HotkeyStatus {
        &self.status
    }

    pub fn controller(&self) -> &OverlayController<A, S, UiSender> {
        &self.controller
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
