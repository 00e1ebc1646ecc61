//! Overlay lifecycle and focus arbitration.
//!
//! `OverlayController` is the only owner of overlay visibility and of the
//! text being composed. It runs on the UI thread and is driven entirely by
//! [`OverlayEvent`]s taken off the UI queue:
//!
//! ```text
//! Hidden --hotkey--> Visible   (new buffer, present, claim focus)
//! Visible --hotkey--> Hidden   (buffer discarded)
//! Visible --submit--> Hidden   (non-blank buffer committed to the sink)
//! Visible --escape--> Hidden
//! ```
//!
//! A hotkey arriving while the focus claim is still being retried is
//! coalesced, so `present_above_all` and `dismiss` always alternate.

use std::time::Duration;

use tracing::{debug, warn};

use crate::capture::CaptureSink;
use crate::config::Config;
use crate::dispatch::Deferrer;
use crate::error::StackError;
use crate::focus::{FocusArbiter, FocusClaim, OVERLAY_FIELD, OVERLAY_SURFACE};
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Hidden,
    Visible,
}

/// Text being composed in the overlay. Exists only while Visible.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    fn replace(&mut self, text: String) {
        self.text = text;
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn into_text(self) -> String {
        self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    HotkeyPressed,
    /// Full current contents of the input field
    TextChanged(String),
    /// Enter in the input field
    Submit,
    Escape,
    /// Programmatic dismissal (e.g. the app is shutting down)
    Cancel,
    /// Deferred re-assertion of keyboard focus for the given show cycle
    FocusRetry { cycle: u64 },
}

/// How hard to try to get keyboard focus into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRetryPolicy {
    /// Total claim attempts, including the immediate one
    pub attempts: u32,
    /// Delay before each re-attempt
    pub delay: Duration,
}

impl Default for FocusRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: crate::config::DEFAULT_FOCUS_RETRY_ATTEMPTS,
            delay: Duration::from_millis(crate::config::DEFAULT_FOCUS_RETRY_DELAY_MS),
        }
    }
}

impl FocusRetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.get_focus_retry_attempts(),
            delay: config.get_focus_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPhase {
    Settled,
    /// `attempt` claims have been denied so far and a retry is scheduled
    Claiming { attempt: u32 },
}

pub struct OverlayController<A, S, D> {
    arbiter: A,
    sink: S,
    deferrer: D,
    policy: FocusRetryPolicy,
    state: OverlayState,
    buffer: Option<InputBuffer>,
    cycle: u64,
    focus: FocusPhase,
}

impl<A, S, D> OverlayController<A, S, D>
where
    A: FocusArbiter,
    S: CaptureSink,
    D: Deferrer,
{
    pub fn new(arbiter: A, sink: S, deferrer: D, policy: FocusRetryPolicy) -> Self {
        Self {
            arbiter,
            sink,
            deferrer,
            policy: FocusRetryPolicy {
                attempts: policy.attempts.max(1),
                ..policy
            },
            state: OverlayState::Hidden,
            buffer: None,
            cycle: 0,
            focus: FocusPhase::Settled,
        }
    }

    pub fn handle(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::HotkeyPressed => self.on_hotkey_pressed(),
            OverlayEvent::TextChanged(text) => self.on_text_changed(text),
            OverlayEvent::Submit => self.on_submit(),
            OverlayEvent::Escape | OverlayEvent::Cancel => self.on_cancel(),
            OverlayEvent::FocusRetry { cycle } => self.on_focus_retry(cycle),
        }
    }

    pub fn on_hotkey_pressed(&mut self) {
        match (self.state, self.focus) {
            (OverlayState::Hidden, _) => self.show(),
            (OverlayState::Visible, FocusPhase::Claiming { attempt }) => {
                logging::log(
                    "OVERLAY",
                    &format!(
                        "Hotkey ignored: focus claim in flight (cycle {}, attempt {})",
                        self.cycle, attempt
                    ),
                );
            }
            (OverlayState::Visible, FocusPhase::Settled) => self.hide("toggled"),
        }
    }

    fn on_text_changed(&mut self, text: String) {
        match self.buffer.as_mut() {
            Some(buffer) => buffer.replace(text),
            None => debug!("Text change while hidden dropped"),
        }
    }

    fn on_submit(&mut self) {
        let Some(buffer) = self.buffer.take() else {
            debug!("Submit while hidden dropped");
            return;
        };

        if buffer.is_blank() {
            self.hide("blank submit");
            return;
        }

        self.sink.commit(buffer.into_text());
        self.hide("committed");
    }

    fn on_cancel(&mut self) {
        if self.state == OverlayState::Visible {
            self.hide("cancelled");
        }
    }

    fn on_focus_retry(&mut self, cycle: u64) {
        let FocusPhase::Claiming { attempt } = self.focus else {
            debug!(cycle, "Focus retry with no claim pending");
            return;
        };
        if self.state != OverlayState::Visible || cycle != self.cycle {
            debug!(cycle, current = self.cycle, "Stale focus retry ignored");
            return;
        }
        self.claim_focus(attempt + 1);
    }

    fn show(&mut self) {
        self.cycle += 1;
        self.buffer = Some(InputBuffer::default());
        self.state = OverlayState::Visible;
        self.arbiter.present_above_all(OVERLAY_SURFACE);
        logging::log("OVERLAY", &format!("Shown (cycle {})", self.cycle));
        self.claim_focus(1);
    }

    fn claim_focus(&mut self, attempt: u32) {
        match self
            .arbiter
            .claim_keyboard_focus(OVERLAY_SURFACE, OVERLAY_FIELD)
        {
            FocusClaim::Granted => {
                debug!(cycle = self.cycle, attempt, "Keyboard focus granted");
                self.focus = FocusPhase::Settled;
            }
            FocusClaim::Denied if attempt < self.policy.attempts => {
                debug!(cycle = self.cycle, attempt, "Keyboard focus denied, retrying");
                self.focus = FocusPhase::Claiming { attempt };
                self.deferrer.defer(
                    self.policy.delay,
                    OverlayEvent::FocusRetry { cycle: self.cycle },
                );
            }
            FocusClaim::Denied => {
                self.focus = FocusPhase::Settled;
                let err = StackError::FocusClaimFailure { attempts: attempt };
                warn!(cycle = self.cycle, error = %err, "{}", err.user_message());
            }
        }
    }

    fn hide(&mut self, reason: &str) {
        self.buffer = None;
        self.focus = FocusPhase::Settled;
        self.state = OverlayState::Hidden;
        self.arbiter.dismiss(OVERLAY_SURFACE);
        logging::log(
            "OVERLAY",
            &format!("Hidden (cycle {}, {})", self.cycle, reason),
        );
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == OverlayState::Visible
    }

    /// Current buffer text, `None` while hidden
    pub fn buffer_text(&self) -> Option<&str> {
        self.buffer.as_ref().map(InputBuffer::text)
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_claiming_focus(&self) -> bool {
        matches!(self.focus, FocusPhase::Claiming { .. })
    }

    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
