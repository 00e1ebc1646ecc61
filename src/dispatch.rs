//! The UI task queue.
//!
//! Everything that mutates overlay state runs on the thread that owns the
//! [`UiQueue`]. Other threads (the hotkey listener, timers, stdin) only hold
//! a [`UiSender`] and post.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::overlay::OverlayEvent;

/// Work for the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Overlay(OverlayEvent),
    /// Time to re-check input monitoring permission
    PermissionRecheck,
    Quit,
}

/// Schedules an overlay event for later delivery on the UI queue.
pub trait Deferrer {
    fn defer(&self, delay: Duration, event: OverlayEvent);
}

#[derive(Clone)]
pub struct UiSender {
    tx: Sender<UiEvent>,
}

impl UiSender {
    /// Post an event. Returns false once the queue has been dropped.
    pub fn post(&self, event: UiEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn post_overlay(&self, event: OverlayEvent) -> bool {
        self.post(UiEvent::Overlay(event))
    }

    /// Post `event` every `interval` until the queue goes away.
    pub fn post_every(&self, interval: Duration, event: UiEvent) -> std::io::Result<()> {
        let sender = self.clone();
        thread::Builder::new()
            .name("stack-ticker".to_string())
            .spawn(move || loop {
                thread::sleep(interval);
                if !sender.post(event.clone()) {
                    break;
                }
            })?;
        Ok(())
    }
}

impl Deferrer for UiSender {
    fn defer(&self, delay: Duration, event: OverlayEvent) {
        let sender = self.clone();
        let delayed = event.clone();
        let spawned = thread::Builder::new()
            .name("stack-defer".to_string())
            .spawn(move || {
                thread::sleep(delay);
                sender.post_overlay(delayed);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn timer thread, delivering immediately");
            self.post_overlay(event);
        }
    }
}

pub struct UiQueue {
    rx: Receiver<UiEvent>,
}

/// Create a connected sender/queue pair.
pub fn ui_queue() -> (UiSender, UiQueue) {
    let (tx, rx) = mpsc::channel();
    (UiSender { tx }, UiQueue { rx })
}

impl UiQueue {
    /// Next event, or `None` when every sender is gone.
    ///
    /// `pump` is called between polls with a bounded timeout so the platform
    /// event loop keeps running on this thread. Pass `None` to block.
    pub fn next(&self, pump: Option<&mut dyn FnMut(Duration)>) -> Option<UiEvent> {
        const SLICE: Duration = Duration::from_millis(10);

        let Some(pump) = pump else {
            return self.rx.recv().ok();
        };

        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(mpsc::TryRecvError::Disconnected) => {
                    debug!("UI queue disconnected");
                    return None;
                }
                Err(mpsc::TryRecvError::Empty) => pump(SLICE),
            }
        }
    }

    /// Wait up to `timeout` for an event. Used by tests.
    pub fn next_timeout(&self, timeout: Duration) -> Option<UiEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain whatever is queued right now
    pub fn drain(&self) -> Vec<UiEvent> {
        self.rx.try_iter().collect()
    }
}
